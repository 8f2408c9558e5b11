//! Build recipe for surfacing a cache mount inside an image
//!
//! The recipe copies a timestamp file in (so the layer is rebuilt on every
//! run) and then copies the mounted cache into a fixed directory of the image,
//! where a throwaway container can later pick it up.

use crate::cache::options::CacheEntry;

/// Default base image for the extraction build
pub const DEFAULT_BASE_IMAGE: &str = "busybox:1";

/// Tag of the image produced by the extraction build
pub const EXTRACT_IMAGE_TAG: &str = "dance:extract";

/// Recipe file name inside the scratch directory
pub const RECIPE_FILE: &str = "Dancefile.extract";

/// Timestamp file name inside the scratch directory
pub const BUILDSTAMP_FILE: &str = "buildstamp";

/// Directory inside the image holding the copied cache
pub const IMAGE_CACHE_DIR: &str = "/var/dance-cache/";

/// Mount point of the host destination inside the copy-out container
pub const HOST_MOUNT_POINT: &str = "/opt/mount";

/// Render the extraction recipe for a cache entry
pub fn render(base_image: &str, entry: &CacheEntry) -> String {
    render_parts(base_image, entry.target_path(), &entry.mount_args())
}

/// Render the extraction recipe from its raw parts
///
/// Mount args and target are embedded verbatim.
pub fn render_parts(base_image: &str, target_path: &str, mount_args: &str) -> String {
    format!(
        "\nFROM {base}\nCOPY {stamp} {stamp}\nRUN --mount={mount} ls -al {target} && cp -p -R {target} {dir}\n",
        base = base_image,
        stamp = BUILDSTAMP_FILE,
        mount = mount_args,
        target = target_path,
        dir = IMAGE_CACHE_DIR,
    )
}

//! Integration tests for cache-dance

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command isolated from any global or project-local configuration
    fn dance(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("cache-dance");
        cmd.current_dir(temp.path())
            .env_remove("DANCE_CACHE_MAP")
            .env_remove("DANCE_SKIP_EXTRACTION")
            .env_remove("DANCE_SCRATCH_DIR")
            .env_remove("DANCE_BUILDER")
            .args(["--no-local", "--config"])
            .arg(temp.path().join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        dance(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Extract BuildKit cache mounts"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        dance(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("cache-dance"));
    }

    #[test]
    fn recipe_prints_mount_and_copy() {
        let temp = TempDir::new().unwrap();
        dance(&temp)
            .args(["recipe", "--cache-map", r#"{"./.cache/foo": "/cache/foo"}"#])
            .assert()
            .success()
            .stdout(predicate::str::contains("FROM busybox:1"))
            .stdout(predicate::str::contains(
                "RUN --mount=type=cache,target=/cache/foo ls -al /cache/foo && cp -p -R /cache/foo /var/dance-cache/",
            ));
    }

    #[test]
    fn recipe_reads_cache_map_from_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.toml"),
            r#"
                [extract]
                base_image = "alpine:3"

                [cache_map]
                "./.cache/apt" = { target = "/var/cache/apt", sharing = "locked" }
            "#,
        )
        .unwrap();

        dance(&temp)
            .arg("recipe")
            .assert()
            .success()
            .stdout(predicate::str::contains("FROM alpine:3"))
            .stdout(predicate::str::contains(
                "type=cache,target=/var/cache/apt,sharing=locked",
            ));
    }

    #[test]
    fn recipe_without_caches() {
        let temp = TempDir::new().unwrap();
        dance(&temp)
            .arg("recipe")
            .assert()
            .success()
            .stdout(predicate::str::contains("No caches configured"));
    }

    #[test]
    fn unknown_mount_key_names_the_entry() {
        let temp = TempDir::new().unwrap();
        dance(&temp)
            .args([
                "recipe",
                "--cache-map",
                r#"{"./.cache/foo": {"target": "/cache/foo", "sharing_mode": "locked"}}"#,
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("./.cache/foo"))
            .stderr(predicate::str::contains("sharing_mode"));
    }

    #[test]
    fn skip_extraction_does_nothing() {
        let temp = TempDir::new().unwrap();
        dance(&temp)
            .args([
                "extract",
                "--skip-extraction",
                "--cache-map",
                r#"{"./.cache/foo": "/cache/foo"}"#,
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("skip-extraction is set"));

        assert!(!temp.path().join(".cache").exists());
        assert!(!temp.path().join("scratch").exists());
    }

    #[test]
    fn invalid_cache_map_fails() {
        let temp = TempDir::new().unwrap();
        dance(&temp)
            .args(["extract", "--cache-map", r#"["./.cache/foo"]"#])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid cache map"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn missing_engine_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.toml"),
            "[engine]\nprogram = \"cache-dance-test-missing-engine\"\n",
        )
        .unwrap();

        dance(&temp)
            .args(["extract", "--cache-map", r#"{"./out": "/cache/foo"}"#])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Container engine not found"));
    }

    #[cfg(unix)]
    mod fake_engine {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        /// Write an executable engine stand-in that logs its arguments
        fn write_engine(temp: &TempDir, body: &str) {
            let path = temp.path().join("fake-docker");
            let script = format!(
                "#!/bin/sh\necho \"$@\" >> \"{log}\"\n{body}\n",
                log = temp.path().join("engine.log").display(),
                body = body,
            );
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

            std::fs::write(
                temp.path().join("config.toml"),
                format!("[engine]\nprogram = \"{}\"\n", path.display()),
            )
            .unwrap();
        }

        fn engine_log(temp: &TempDir) -> Vec<String> {
            std::fs::read_to_string(temp.path().join("engine.log"))
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }

        fn cache_map(dest: &Path) -> String {
            format!(r#"{{"{}": "/cache/foo"}}"#, dest.display())
        }

        // `run -v <host>:/opt/mount ...` populates the host side
        const POPULATING_ENGINE: &str = r#"
if [ "$1" = "run" ]; then
  host="${3%%:*}"
  mkdir -p "$host/dance-cache" && echo data > "$host/dance-cache/file"
fi
exit 0"#;

        #[test]
        fn populated_cache_is_extracted() {
            let temp = TempDir::new().unwrap();
            write_engine(&temp, POPULATING_ENGINE);
            let dest = temp.path().join("out");

            dance(&temp)
                .args(["extract", "--cache-map", cache_map(&dest).as_str()])
                .assert()
                .success()
                .stdout(predicate::str::contains("FROM busybox:1"))
                .stdout(predicate::str::contains(
                    "RUN --mount=type=cache,target=/cache/foo ls -al /cache/foo",
                ))
                .stdout(predicate::str::contains("Cache extracted successfully"));

            let log = engine_log(&temp);
            assert_eq!(log.len(), 2);
            assert!(log[0].starts_with("buildx build -f "));
            assert!(log[0].contains("--tag dance:extract --load"));
            assert!(log[1].starts_with("run -v "));
            assert!(log[1].ends_with(
                ":/opt/mount --rm --entrypoint cp dance:extract -p -R /var/dance-cache/ /opt/mount/"
            ));

            assert_eq!(
                std::fs::read_to_string(dest.join("dance-cache").join("file")).unwrap(),
                "data\n"
            );
            assert!(temp.path().join("scratch").join("buildstamp").exists());
            assert!(temp.path().join("scratch").join("Dancefile.extract").exists());
        }

        #[test]
        fn empty_cache_is_removed() {
            let temp = TempDir::new().unwrap();
            write_engine(&temp, "exit 0");
            let dest = temp.path().join("out");

            dance(&temp)
                .args(["extract", "--cache-map", cache_map(&dest).as_str()])
                .assert()
                .success()
                .stdout(predicate::str::contains("Cache is empty"));

            assert_eq!(engine_log(&temp).len(), 2);
            assert!(!dest.exists());
        }

        #[test]
        fn build_failure_stops_before_copy() {
            let temp = TempDir::new().unwrap();
            write_engine(
                &temp,
                "if [ \"$1\" = \"buildx\" ]; then echo 'ERROR: failed to solve' >&2; exit 1; fi\nexit 0",
            );
            let dest = temp.path().join("out");
            std::fs::create_dir_all(&dest).unwrap();
            std::fs::write(dest.join("previous"), "keep").unwrap();

            dance(&temp)
                .args(["extract", "--cache-map", cache_map(&dest).as_str()])
                .assert()
                .failure()
                .stderr(predicate::str::contains("Image build failed"))
                .stderr(predicate::str::contains("failed to solve"));

            let log = engine_log(&temp);
            assert_eq!(log.len(), 1);
            assert!(log[0].starts_with("buildx build"));
            assert_eq!(std::fs::read_to_string(dest.join("previous")).unwrap(), "keep");
        }

        #[test]
        fn builder_flag_is_forwarded() {
            let temp = TempDir::new().unwrap();
            write_engine(&temp, "exit 0");
            let dest = temp.path().join("out");

            dance(&temp)
                .args([
                    "extract",
                    "--builder",
                    "ci-builder",
                    "--cache-map",
                    cache_map(&dest).as_str(),
                ])
                .assert()
                .success();

            assert!(engine_log(&temp)[0].starts_with("buildx build --builder ci-builder -f "));
        }
    }
}

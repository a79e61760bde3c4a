//! Container-side cache invalidation.
//!
//! A settled change may need work inside the running containers before the
//! browser reload is worth anything: stale PHP opcode caches and template
//! caches would otherwise serve the old code. Failures here are logged and
//! swallowed; the reload broadcast must go out either way.

use core::time::Duration;
use std::path::Path;

use sitebridge_common::CommandRunner;
use tracing::{debug, warn};

use crate::classify::FileClass;
use crate::config::ReloadSection;

/// Clears opcache without failing on containers that run PHP without it.
const OPCACHE_RESET_SNIPPET: &str =
    r#"if (function_exists("opcache_reset")) { opcache_reset(); }"#;

/// Run the cache invalidation appropriate for `class` in every configured
/// container.
pub async fn handle_change(
    path: &Path,
    class: FileClass,
    reload: &ReloadSection,
    runner: &dyn CommandRunner,
) {
    // Everything after the `exec <container>` prefix.
    let tail: Vec<String> = match class {
        FileClass::Php => vec![
            "php".to_string(),
            "-r".to_string(),
            OPCACHE_RESET_SNIPPET.to_string(),
        ],
        FileClass::Template => vec![
            "wp".to_string(),
            "cache".to_string(),
            "flush".to_string(),
            "--allow-root".to_string(),
            format!("--path={}", reload.wp_path),
        ],
        // Stylesheets and scripts only need the browser reload.
        FileClass::Stylesheet | FileClass::Script | FileClass::Other => return,
    };

    let timeout = Duration::from_secs(reload.timeout_secs);
    for container in &reload.containers {
        let mut args = vec!["exec".to_string(), container.clone()];
        args.extend_from_slice(&tail);
        match runner.run(&reload.docker_bin, &args, timeout).await {
            Ok(result) if result.success => {
                debug!(container, path = %path.display(), "Cleared container cache");
            }
            Ok(result) => {
                warn!(
                    container,
                    path = %path.display(),
                    exit_code = ?result.exit_code,
                    stderr = %result.stderr.trim(),
                    "Cache clear exited nonzero"
                );
            }
            Err(e) => {
                warn!(container, path = %path.display(), error = %e, "Cache clear failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::future::BoxFuture;
    use sitebridge_common::{CommandResult, RunError};

    use super::*;

    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        fail: bool,
    }

    impl CommandRunner for RecordingRunner {
        fn run<'a>(
            &'a self,
            program: &'a str,
            args: &'a [String],
            _timeout: Duration,
        ) -> BoxFuture<'a, Result<CommandResult, RunError>> {
            Box::pin(async move {
                self.calls
                    .lock()
                    .unwrap()
                    .push((program.to_string(), args.to_vec()));
                if self.fail {
                    Err(RunError::Spawn {
                        command: program.to_string(),
                        source: std::io::Error::other("no docker"),
                    })
                } else {
                    Ok(CommandResult {
                        command: program.to_string(),
                        stdout: String::new(),
                        stderr: String::new(),
                        exit_code: Some(0),
                        success: true,
                    })
                }
            })
        }
    }

    fn reload_with_containers(containers: &[&str]) -> ReloadSection {
        ReloadSection {
            containers: containers.iter().map(ToString::to_string).collect(),
            ..ReloadSection::default()
        }
    }

    #[tokio::test]
    async fn php_changes_reset_opcache_in_every_container() {
        let runner = RecordingRunner::default();
        let reload = reload_with_containers(&["wp_blog", "wp_shop"]);

        handle_change(
            Path::new("/srv/functions.php"),
            FileClass::Php,
            &reload,
            &runner,
        )
        .await;

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "docker");
        assert_eq!(calls[0].1[..2], ["exec", "wp_blog"]);
        assert_eq!(calls[1].1[..2], ["exec", "wp_shop"]);
        assert!(calls[0].1.contains(&"php".to_string()));
    }

    #[tokio::test]
    async fn template_changes_flush_the_wp_cache() {
        let runner = RecordingRunner::default();
        let reload = reload_with_containers(&["wp_blog"]);

        handle_change(
            Path::new("/srv/header.twig"),
            FileClass::Template,
            &reload,
            &runner,
        )
        .await;

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.contains(&"flush".to_string()));
        assert!(calls[0].1.contains(&"--path=/var/www/html".to_string()));
    }

    #[tokio::test]
    async fn stylesheets_and_scripts_skip_the_containers() {
        let runner = RecordingRunner::default();
        let reload = reload_with_containers(&["wp_blog"]);

        handle_change(
            Path::new("/srv/style.css"),
            FileClass::Stylesheet,
            &reload,
            &runner,
        )
        .await;
        handle_change(Path::new("/srv/nav.js"), FileClass::Script, &reload, &runner).await;

        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn exec_failures_are_swallowed() {
        let runner = RecordingRunner {
            fail: true,
            ..RecordingRunner::default()
        };
        let reload = reload_with_containers(&["wp_blog"]);

        handle_change(
            Path::new("/srv/functions.php"),
            FileClass::Php,
            &reload,
            &runner,
        )
        .await;

        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }
}

//! Per-post choreography: show the desktop, open the editor through the
//! detected icon, type the post, drive the save dialog, and verify the file
//! landed on disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use enigo::Key;

use crate::api::{self, Post};
use crate::config::AppConfig;
use crate::detector::{locate_icon, AnnotationSink, MonitorSource, ScreenshotWriter};
use crate::errors::{PostpadError, PostpadResult};
use crate::executor::{title_pattern, wait_for_window, InputDriver};

/// Resolve and create the directory saved files land in. Defaults to
/// `<Desktop>/tjm-project` when no override is configured.
pub fn ensure_target_dir(cfg: &AppConfig) -> PostpadResult<PathBuf> {
    let dir = match &cfg.workflow.target_dir {
        Some(dir) => dir.clone(),
        None => dirs::desktop_dir()
            .ok_or_else(|| PostpadError::Config("cannot resolve desktop directory".into()))?
            .join("tjm-project"),
    };
    std::fs::create_dir_all(&dir)?;
    tracing::info!(dir = %dir.display(), "target directory ready");
    Ok(dir)
}

/// Locate the icon and double-click it. The icon search itself retries
/// internally; on top of that the desktop is re-shown between workflow-level
/// attempts to clear windows that may be covering the icon.
fn open_editor_via_icon(
    input: &mut InputDriver,
    cfg: &AppConfig,
    post_id: Option<u32>,
) -> PostpadResult<bool> {
    let source = MonitorSource::new(cfg.screen.display_index);
    let region = cfg.screen.search_region();
    let writer;
    let sink: Option<&dyn AnnotationSink> = if cfg.detection.save_screenshots {
        writer = ScreenshotWriter::new(&cfg.workflow.screenshots_dir, post_id);
        Some(&writer)
    } else {
        None
    };

    for attempt in 1..=cfg.workflow.open_attempts {
        if attempt > 1 {
            tracing::info!(attempt, "re-showing desktop to clear obscured icons");
            input.show_desktop()?;
        }

        if let Some((x, y)) = locate_icon(&source, region, &cfg.detection, sink)? {
            tracing::info!(x, y, "double-clicking icon");
            input.double_click_at(x as i32, y as i32)?;
            return Ok(true);
        }
    }

    Ok(false)
}

/// Dismiss a potential "file doesn't exist anymore" startup popup. Enter is
/// harmless when no popup is present: the stray newline is cleared before
/// typing.
fn dismiss_startup_popup(input: &mut InputDriver) -> PostpadResult<()> {
    input.pause(400);
    input.press(Key::Return)?;
    input.pause(300);
    Ok(())
}

/// Ctrl+N for a fresh document, then clear any leftover content.
fn open_new_tab(input: &mut InputDriver) -> PostpadResult<()> {
    input.hotkey(&[Key::Control], Key::Unicode('n'))?;
    input.pause(600);
    dismiss_startup_popup(input)?;
    input.hotkey(&[Key::Control], Key::Unicode('a'))?;
    input.pause(100);
    input.press(Key::Delete)?;
    input.pause(200);
    Ok(())
}

fn type_post(input: &mut InputDriver, post: &Post) -> PostpadResult<()> {
    let content = post.content();
    tracing::info!(post_id = post.id, chars = content.len(), "typing post content");
    input.pause(300);
    input.type_text(&content)?;
    input.pause(500);
    Ok(())
}

/// Ctrl+S, type the full path into the save dialog, confirm, and handle the
/// overwrite dialog when the file already existed.
fn save_current_file(
    input: &mut InputDriver,
    directory: &Path,
    filename: &str,
    screen_center: (i32, i32),
) -> PostpadResult<()> {
    std::fs::create_dir_all(directory)?;
    let full_path = directory.join(filename);
    let existed_before = full_path.exists();
    tracing::info!(path = %full_path.display(), existed_before, "saving file");

    input.hotkey(&[Key::Control], Key::Unicode('s'))?;
    input.pause(1000);

    // Replace whatever the dialog pre-filled.
    input.hotkey(&[Key::Control], Key::Unicode('a'))?;
    input.pause(200);
    input.type_text(&full_path.to_string_lossy())?;
    input.pause(500);
    input.press(Key::Return)?;
    input.pause(500);

    if existed_before {
        // "Confirm Save As" defaults to No; move focus left to Yes.
        tracing::info!("confirming overwrite of existing file");
        input.pause(1000);
        input.press(Key::LeftArrow)?;
        input.pause(300);
        input.press(Key::Return)?;
        input.pause(600);
    } else {
        input.pause(1000);
    }

    input.pause(500);
    match std::fs::metadata(&full_path) {
        Ok(meta) => tracing::info!(bytes = meta.len(), "file save verified"),
        Err(_) => tracing::warn!(path = %full_path.display(), "file save verification failed"),
    }
    input.pause(300);

    // Refocus the editor window so the close shortcut targets it.
    input.click_at(screen_center.0, screen_center.1)?;
    input.pause(200);
    Ok(())
}

fn close_editor(input: &mut InputDriver, screen_center: (i32, i32)) -> PostpadResult<()> {
    tracing::info!("closing editor");
    input.pause(500);
    input.click_at(screen_center.0, screen_center.1)?;
    input.pause(300);
    input.hotkey(&[Key::Control, Key::Shift], Key::Unicode('w'))?;
    input.pause(1300);
    Ok(())
}

/// Full flow for a single post.
pub fn process_post(
    input: &mut InputDriver,
    post: &Post,
    target_dir: &Path,
    cfg: &AppConfig,
) -> PostpadResult<()> {
    tracing::info!(post_id = post.id, "processing post");
    let screen_center = (
        cfg.screen.width as i32 / 2,
        cfg.screen.height as i32 / 2,
    );

    input.show_desktop()?;

    if !open_editor_via_icon(input, cfg, Some(post.id))? {
        return Err(PostpadError::Detection(
            "editor icon could not be found after all attempts".into(),
        ));
    }

    let pattern = title_pattern(&cfg.workflow.window_title_pattern)?;
    let timeout = Duration::from_secs(cfg.workflow.window_timeout_secs);
    if !wait_for_window(&pattern, timeout) {
        return Err(PostpadError::Window(
            "editor window not detected after clicking icon".into(),
        ));
    }

    input.pause(500);
    dismiss_startup_popup(input)?;
    input.click_at(screen_center.0, screen_center.1)?;
    input.pause(200);

    open_new_tab(input)?;
    type_post(input, post)?;
    save_current_file(input, target_dir, &post.filename(), screen_center)?;
    close_editor(input, screen_center)?;

    tracing::info!(post_id = post.id, "post finished");
    Ok(())
}

/// Fetch posts and drive the full desktop workflow for each, isolating
/// per-post failures. Returns (successful, failed).
pub async fn run_all(cfg: AppConfig) -> PostpadResult<(usize, usize)> {
    let posts = api::fetch_or_fallback(&cfg.api).await;
    if posts.is_empty() {
        tracing::error!("no posts available, nothing to do");
        return Ok((0, 0));
    }

    let target_dir = ensure_target_dir(&cfg)?;
    tracing::info!(count = posts.len(), "processing posts");

    // The whole choreography is blocking input simulation with fixed delays,
    // so it runs off the async runtime in one dedicated thread.
    let summary = tokio::task::spawn_blocking(move || -> PostpadResult<(usize, usize)> {
        let mut input = InputDriver::new()?;
        let mut successful = 0usize;
        let mut failed = 0usize;

        for post in &posts {
            match process_post(&mut input, post, &target_dir, &cfg) {
                Ok(()) => successful += 1,
                Err(e) => {
                    failed += 1;
                    tracing::error!(post_id = post.id, error = %e, "post failed, continuing");
                }
            }
        }
        Ok((successful, failed))
    })
    .await
    .map_err(|e| PostpadError::Input(format!("workflow task: {e}")))??;

    let (successful, failed) = summary;
    tracing::info!(successful, failed, "processing complete");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn target_dir_override_is_created() {
        let dir = std::env::temp_dir().join(format!("postpad-target-{}", std::process::id()));
        let mut cfg = AppConfig::default();
        cfg.workflow.target_dir = Some(dir.clone());
        let resolved = ensure_target_dir(&cfg).unwrap();
        assert_eq!(resolved, dir);
        assert!(dir.is_dir());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}

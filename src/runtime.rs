//! Session actor
//!
//! A single task owns the [`DisplaySession`] and handles one message at a
//! time, so reports from several panels, host requests and timer redraws
//! never touch session state concurrently. While image or table mode is on,
//! a [`RefreshTimer`] asks for a redraw every refresh interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cadence_transport::PanelTransport;
use image::RgbImage;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::DriverConfig;
use crate::error::{DriverError, NavigationError};
use crate::session::{DisplayMode, DisplaySession};

const QUEUE_DEPTH: usize = 64;

/// Capture still running on the blocking pool
type CaptureJob = JoinHandle<Result<RgbImage, NavigationError>>;

/// Requests handled by the session task
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMessage {
    /// Raw input report from panel `panel`
    Report { panel: usize, data: Vec<u8> },
    /// New text-mode content from the host
    TextCells(Vec<u8>),
    ToggleImage,
    ToggleTable,
    CycleLayout,
    /// Draw the current refreshing mode again
    Redraw,
    Shutdown,
}

/// Cloneable handle to a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionMessage>,
}

impl SessionHandle {
    pub async fn send(&self, message: SessionMessage) -> Result<(), DriverError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| DriverError::SessionClosed)
    }

    pub async fn report(&self, panel: usize, data: Vec<u8>) -> Result<(), DriverError> {
        self.send(SessionMessage::Report { panel, data }).await
    }

    pub async fn show_text(&self, cells: Vec<u8>) -> Result<(), DriverError> {
        self.send(SessionMessage::TextCells(cells)).await
    }

    pub async fn toggle_image(&self) -> Result<(), DriverError> {
        self.send(SessionMessage::ToggleImage).await
    }

    pub async fn toggle_table(&self) -> Result<(), DriverError> {
        self.send(SessionMessage::ToggleTable).await
    }

    pub async fn cycle_layout(&self) -> Result<(), DriverError> {
        self.send(SessionMessage::CycleLayout).await
    }

    pub async fn shutdown(&self) -> Result<(), DriverError> {
        self.send(SessionMessage::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Timing for a session task
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub refresh_interval: Duration,
    pub capture_timeout: Duration,
}

impl From<&DriverConfig> for SessionOptions {
    fn from(config: &DriverConfig) -> Self {
        Self {
            refresh_interval: config.refresh_interval(),
            capture_timeout: config.capture_timeout(),
        }
    }
}

/// Periodic redraw requests.
///
/// At most one timer redraw is queued at a time: the tick is skipped while
/// `pending` is set, and the session clears it when the redraw runs.
pub struct RefreshTimer {
    task: Option<JoinHandle<()>>,
}

impl RefreshTimer {
    pub fn start(
        period: Duration,
        tx: mpsc::WeakSender<SessionMessage>,
        pending: Arc<AtomicBool>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if pending.swap(true, Ordering::SeqCst) {
                    continue;
                }
                let Some(tx) = tx.upgrade() else {
                    break;
                };
                if tx.send(SessionMessage::Redraw).await.is_err() {
                    break;
                }
            }
        });
        debug!("Refresh timer started ({:?})", period);
        Self { task: Some(task) }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop ticking. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Refresh timer cancelled");
        }
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run `session` on its own task.
///
/// The join handle yields the session back once it has shut down, either
/// on [`SessionMessage::Shutdown`] or when every handle is dropped.
pub fn spawn_session(
    session: DisplaySession,
    options: SessionOptions,
) -> (SessionHandle, JoinHandle<DisplaySession>) {
    let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
    let weak = tx.downgrade();
    let task = tokio::spawn(run_session(session, rx, weak, options));
    (SessionHandle { tx }, task)
}

async fn run_session(
    mut session: DisplaySession,
    mut rx: mpsc::Receiver<SessionMessage>,
    tx: mpsc::WeakSender<SessionMessage>,
    options: SessionOptions,
) -> DisplaySession {
    let pending = Arc::new(AtomicBool::new(false));
    let mut timer: Option<RefreshTimer> = None;
    let mut in_flight: Option<CaptureJob> = None;

    while let Some(message) = rx.recv().await {
        let redraw = match message {
            SessionMessage::Report { panel, data } => session.handle_report(panel, &data).redraw,
            SessionMessage::TextCells(cells) => {
                session.show_text(&cells);
                false
            }
            SessionMessage::ToggleImage => session.toggle_image(),
            SessionMessage::ToggleTable => session.toggle_table(),
            SessionMessage::CycleLayout => session.cycle_layout(),
            SessionMessage::Redraw => {
                pending.store(false, Ordering::SeqCst);
                true
            }
            SessionMessage::Shutdown => break,
        };

        sync_timer(&session, &mut timer, &tx, &pending, options.refresh_interval);
        if redraw && session.mode().is_refreshing() {
            redraw_frame(&mut session, &mut in_flight, options.capture_timeout).await;
            // A failed frame may have left the mode
            sync_timer(&session, &mut timer, &tx, &pending, options.refresh_interval);
        }
    }

    if let Some(mut timer) = timer.take() {
        timer.cancel();
    }
    session.shutdown();
    session
}

fn sync_timer(
    session: &DisplaySession,
    timer: &mut Option<RefreshTimer>,
    tx: &mpsc::WeakSender<SessionMessage>,
    pending: &Arc<AtomicBool>,
    period: Duration,
) {
    let refreshing = session.mode().is_refreshing();
    match (refreshing, timer.is_some()) {
        (true, false) => {
            pending.store(false, Ordering::SeqCst);
            *timer = Some(RefreshTimer::start(period, tx.clone(), Arc::clone(pending)));
        }
        (false, true) => {
            if let Some(mut t) = timer.take() {
                t.cancel();
            }
        }
        _ => {}
    }
}

/// Draw one frame, running the capture on the blocking pool.
///
/// A capture that outlives `timeout` is abandoned and costs only this frame.
/// It stays in `in_flight` until it returns; no other capture starts
/// meanwhile and its late result is discarded.
async fn redraw_frame(
    session: &mut DisplaySession,
    in_flight: &mut Option<CaptureJob>,
    timeout: Duration,
) {
    match session.mode() {
        DisplayMode::Text => {}
        DisplayMode::Table => session.present_table(),
        DisplayMode::Image => {
            let request = match session.prepare_image_frame() {
                Ok(request) => request,
                Err(e) => {
                    session.handle_navigation_error(e);
                    return;
                }
            };

            if let Some(stuck) = in_flight.take() {
                if !stuck.is_finished() {
                    debug!("Previous capture still running, frame skipped");
                    *in_flight = Some(stuck);
                    return;
                }
                debug!("Late capture result discarded");
            }

            let capture = session.capture();
            let mut job = tokio::task::spawn_blocking(move || {
                capture.capture(&request.region, request.width, request.height)
            });
            let result = match tokio::time::timeout(timeout, &mut job).await {
                Err(_) => {
                    *in_flight = Some(job);
                    Err(NavigationError::CaptureTimeout(timeout.as_millis() as u64))
                }
                Ok(Err(e)) => Err(NavigationError::Capture(e.to_string())),
                Ok(Ok(frame)) => frame,
            };

            match result {
                Ok(frame) => session.present_image(&frame),
                Err(e) => session.handle_navigation_error(e),
            }
        }
    }
}

/// Forward every panel's input reports to the session.
///
/// Panel `i` of `panels` must be panel `i` of the session layout.
pub fn attach_reports(panels: &[Arc<dyn PanelTransport>], handle: &SessionHandle) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::new();
    for (index, panel) in panels.iter().enumerate() {
        let Some(mut reports) = panel.subscribe_reports() else {
            warn!("Panel {}: no input reports, keys disabled", index);
            continue;
        };
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            loop {
                match reports.recv().await {
                    Ok(report) => {
                        if handle.report(index, report.data).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Panel {}: dropped {} input reports", index, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Panel {}: input closed", index);
                        break;
                    }
                }
            }
        }));
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CaptureRegion, Viewport};
    use crate::host::{HostObject, ImageFileCapture, ScreenCapture, StaticHost};
    use crate::memory_panel::MemoryPanel;
    use cadence_transport::Handedness;
    use image::Rgb;
    use std::sync::atomic::AtomicUsize;

    const ROW3: [u8; 5] = [0, 0, 0, 0, 0b0100];
    const NONE: [u8; 5] = [0; 5];

    fn host() -> Arc<StaticHost> {
        Arc::new(StaticHost::new(Some(HostObject::new(
            "1",
            "Window",
            Some(Viewport { left: 60.0, top: 40.0, width: 120.0, height: 80.0 }),
        ))))
    }

    fn screen() -> Arc<ImageFileCapture> {
        Arc::new(ImageFileCapture::new(RgbImage::from_pixel(240, 160, Rgb([0, 0, 0]))))
    }

    fn options(refresh_ms: u64, timeout_ms: u64) -> SessionOptions {
        SessionOptions {
            refresh_interval: Duration::from_millis(refresh_ms),
            capture_timeout: Duration::from_millis(timeout_ms),
        }
    }

    fn new_session(panel: &Arc<MemoryPanel>, capture: Arc<dyn ScreenCapture>) -> DisplaySession {
        DisplaySession::new(
            vec![Arc::clone(panel) as Arc<dyn PanelTransport>],
            host(),
            capture,
            &DriverConfig::default(),
        )
        .unwrap()
    }

    async fn wait_for(mut cond: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached");
    }

    #[derive(Default)]
    struct CaptureCounts {
        started: AtomicUsize,
        running: AtomicUsize,
        most_running: AtomicUsize,
    }

    struct SlowCapture {
        delay: Duration,
        counts: Arc<CaptureCounts>,
    }

    impl SlowCapture {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                counts: Arc::default(),
            }
        }
    }

    impl ScreenCapture for SlowCapture {
        fn capture(&self, _: &CaptureRegion, width: u32, height: u32) -> Result<RgbImage, NavigationError> {
            let c = &self.counts;
            c.started.fetch_add(1, Ordering::SeqCst);
            let now = c.running.fetch_add(1, Ordering::SeqCst) + 1;
            c.most_running.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            c.running.fetch_sub(1, Ordering::SeqCst);
            Ok(RgbImage::new(width, height))
        }

        fn screen_size(&self) -> Option<(u32, u32)> {
            Some((240, 160))
        }
    }

    #[tokio::test]
    async fn test_image_mode_refreshes_until_toggled_off() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let (handle, task) = spawn_session(new_session(&panel, screen()), options(10, 1000));

        handle.show_text(vec![0x11; 48]).await.unwrap();
        handle.toggle_image().await.unwrap();
        // Black screen, reversed threshold: every dot raised
        wait_for(|| panel.frame_count() >= 4).await;
        assert_eq!(panel.last_frame(), Some(vec![0xFF; 48]));

        handle.toggle_image().await.unwrap();
        wait_for(|| panel.last_frame() == Some(vec![0x11; 48])).await;
        let settled = panel.frame_count();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(panel.frame_count(), settled);

        handle.shutdown().await.unwrap();
        let session = task.await.unwrap();
        assert_eq!(session.mode(), DisplayMode::Text);
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_panel_reports_reach_session() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let transports = vec![Arc::clone(&panel) as Arc<dyn PanelTransport>];
        let (handle, task) = spawn_session(new_session(&panel, screen()), options(1000, 1000));
        let readers = attach_reports(&transports, &handle);
        assert_eq!(readers.len(), 1);

        panel.push_report(&ROW3);
        panel.push_report(&NONE);
        // Entering image mode switches the firmware to two-handed
        wait_for(|| panel.one_handed_history() == vec![false]).await;

        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert_eq!(panel.one_handed_history(), vec![false, true]);
        for reader in readers {
            reader.abort();
        }
    }

    #[tokio::test]
    async fn test_capture_timeout_keeps_image_mode() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let slow = Arc::new(SlowCapture::new(Duration::from_millis(100)));
        let (handle, task) = spawn_session(new_session(&panel, slow), options(1000, 10));

        handle.toggle_image().await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.shutdown().await.unwrap();
        let session = task.await.unwrap();
        // Shutdown leaves the mode itself; the timeout did not
        assert_eq!(panel.one_handed_history(), vec![false, true]);
        assert_eq!(panel.frame_count(), 0);
        assert_eq!(session.mode(), DisplayMode::Text);
    }

    #[tokio::test]
    async fn test_stuck_capture_blocks_new_captures() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let slow = Arc::new(SlowCapture::new(Duration::from_millis(200)));
        let counts = Arc::clone(&slow.counts);
        let (handle, task) = spawn_session(new_session(&panel, slow), options(10, 10));

        handle.toggle_image().await.unwrap();
        wait_for(|| counts.started.load(Ordering::SeqCst) >= 1).await;
        // Many refresh ticks pass while the first capture is stuck
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counts.started.load(Ordering::SeqCst), 1);

        // Once it returns, the next tick captures again
        wait_for(|| counts.started.load(Ordering::SeqCst) >= 2).await;
        assert_eq!(counts.most_running.load(Ordering::SeqCst), 1);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert_eq!(panel.frame_count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_handles_stops_session() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let (handle, task) = spawn_session(new_session(&panel, screen()), options(10, 1000));
        handle.toggle_table().await.unwrap();
        wait_for(|| panel.frame_count() >= 2).await;
        drop(handle);
        let session = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("session did not stop")
            .unwrap();
        assert_eq!(session.mode(), DisplayMode::Text);
    }

    #[tokio::test]
    async fn test_refresh_timer_cancel_is_idempotent() {
        let (tx, mut rx) = mpsc::channel(4);
        let pending = Arc::new(AtomicBool::new(false));
        let mut timer = RefreshTimer::start(Duration::from_millis(5), tx.downgrade(), Arc::clone(&pending));
        assert_eq!(rx.recv().await, Some(SessionMessage::Redraw));
        assert!(timer.is_running());

        timer.cancel();
        timer.cancel();
        assert!(!timer.is_running());
    }

    #[tokio::test]
    async fn test_refresh_timer_coalesces() {
        let (tx, mut rx) = mpsc::channel(4);
        let pending = Arc::new(AtomicBool::new(false));
        let timer = RefreshTimer::start(Duration::from_millis(5), tx.downgrade(), Arc::clone(&pending));
        tokio::time::sleep(Duration::from_millis(60)).await;
        drop(timer);

        // Nobody cleared the flag, so only the first tick was queued
        assert_eq!(rx.recv().await, Some(SessionMessage::Redraw));
        assert!(rx.try_recv().is_err());
    }
}

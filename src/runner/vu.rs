use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::shutdown::ShutdownReceiver;
use crate::workload::{Dispatcher, RngChoices, WorkloadDriver};

/// Handle on one running virtual user.
pub(super) struct ActiveVu {
    id: usize,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<u64>,
}

impl ActiveVu {
    /// Asks the VU to exit after its in-flight iteration.
    pub(super) fn stop(self) -> JoinHandle<u64> {
        drop(self.stop_tx.send(true));
        debug!("VU {} asked to stop", self.id);
        self.handle
    }
}

/// Spawns a VU looping iteration, then pacing, until stopped. A stop request
/// lets the in-flight iteration finish; shutdown abandons it, and an
/// abandoned iteration records nothing. Resolves to the completed iteration
/// count.
pub(super) fn spawn_vu<D>(
    driver: Arc<WorkloadDriver<D>>,
    id: usize,
    mut shutdown_rx: ShutdownReceiver,
) -> ActiveVu
where
    D: Dispatcher + 'static,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        let mut choices = RngChoices::from_entropy();
        let mut iterations: u64 = 0;

        loop {
            if *stop_rx.borrow() {
                break;
            }

            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = driver.execute_iteration(&mut choices) => {
                    iterations = iterations.saturating_add(1);
                }
            }

            let pause = driver.pacing().draw(&mut choices);
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                () = sleep(pause) => {}
            }
        }

        debug!("VU {} finished after {} iterations", id, iterations);
        iterations
    });

    ActiveVu {
        id,
        stop_tx,
        handle,
    }
}

//! Per-transition trace lines follow the verbosity flag

use chain_contention::{
    OrderedChain, Outcome, SharedPools, TerminationPolicy, Transition, Worker, WorkerSettings,
};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLog {
    type Writer = CapturedLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs intake, probe and acknowledge on one item and returns the log output.
fn traced_transitions(verbose: bool) -> String {
    let log = CapturedLog::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(log.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    let chain = Arc::new(OrderedChain::new());
    let pools = Arc::new(SharedPools::new(vec![7]));
    let settings = WorkerSettings {
        universe_size: 7,
        termination: TerminationPolicy::Outstanding,
        verbose,
        seed: 1,
    };

    tracing::subscriber::with_default(subscriber, || {
        let mut worker = Worker::new(0, chain, pools, settings).expect("worker builds");
        assert_eq!(worker.apply(Transition::Intake), Outcome::Inserted(7));
        assert!(matches!(
            worker.apply(Transition::Probe),
            Outcome::Probed { .. }
        ));
        assert_eq!(worker.apply(Transition::Acknowledge), Outcome::Acknowledged(7));
    });

    log.text()
}

#[test]
fn verbose_worker_logs_every_transition() {
    let out = traced_transitions(true);

    assert!(out.contains("moved item from pool into chain"), "{out}");
    assert!(out.contains("probed chain"), "{out}");
    assert!(out.contains("recorded completed item"), "{out}");
    assert!(out.contains("item=7"), "{out}");
    assert_eq!(out.lines().count(), 3, "{out}");
}

#[test]
fn quiet_worker_logs_nothing() {
    let out = traced_transitions(false);
    assert!(out.trim().is_empty(), "{out}");
}

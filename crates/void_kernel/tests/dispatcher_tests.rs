//! Main-thread dispatch from worker threads

mod common;

use std::sync::Arc;
use std::thread;

use common::frame;
use parking_lot::Mutex;
use void_core::Error;
use void_kernel::{ActionStatus, DispatcherConfig, Engine, EngineConfig, MainThreadDispatcher};

fn dispatcher(budget: usize) -> MainThreadDispatcher {
    MainThreadDispatcher::new(DispatcherConfig {
        budget,
        ..Default::default()
    })
}

#[test]
fn test_budget_limits_each_drain() {
    let dispatcher = dispatcher(3);
    let order = Arc::new(Mutex::new(Vec::new()));
    for name in ["A", "B", "C", "D"] {
        let order = order.clone();
        dispatcher.enqueue_action(name, move || order.lock().push(name));
    }

    assert_eq!(dispatcher.update(&frame(1)), 3);
    assert_eq!(*order.lock(), vec!["A", "B", "C"]);
    assert_eq!(dispatcher.pending(), 1);

    assert_eq!(dispatcher.update(&frame(2)), 1);
    assert_eq!(*order.lock(), vec!["A", "B", "C", "D"]);
}

#[test]
fn test_panicking_action_does_not_stop_batch() {
    let dispatcher = dispatcher(3);
    let order = Arc::new(Mutex::new(Vec::new()));
    for name in ["A", "B", "C"] {
        let order = order.clone();
        dispatcher.enqueue_action(name, move || {
            if name == "B" {
                panic!("B failed");
            }
            order.lock().push(name);
        });
    }

    dispatcher.update(&frame(1));
    assert_eq!(*order.lock(), vec!["A", "C"]);

    let stats = dispatcher.stats();
    assert_eq!(stats.total_executed, 3);
    assert_eq!(stats.total_failed, 1);

    let statuses: Vec<_> = dispatcher
        .recent()
        .into_iter()
        .map(|r| (r.name, r.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("A".to_string(), ActionStatus::Succeeded),
            ("B".to_string(), ActionStatus::Failed),
            ("C".to_string(), ActionStatus::Succeeded),
        ]
    );
}

#[test]
fn test_update_off_main_thread_dequeues_nothing() {
    let dispatcher = dispatcher(10);
    dispatcher.enqueue_action("stay", || {});

    thread::scope(|scope| {
        let executed = scope.spawn(|| dispatcher.update(&frame(1))).join().unwrap();
        assert_eq!(executed, 0);

        let attempt = scope.spawn(|| dispatcher.try_update(&frame(1))).join().unwrap();
        assert_eq!(
            attempt,
            Err(Error::WrongThread {
                operation: "dispatcher update"
            })
        );
    });
    assert_eq!(dispatcher.pending(), 1);
    assert_eq!(dispatcher.stats().total_executed, 0);

    assert_eq!(dispatcher.try_update(&frame(1)), Ok(1));
}

#[test]
fn test_workers_hand_results_to_main_thread() {
    let mut engine = Engine::new(EngineConfig::default());
    let total = Arc::new(Mutex::new(0u64));
    let main = thread::current().id();

    let workers: Vec<_> = (0..4u64)
        .map(|worker| {
            let handle = engine.dispatcher_handle();
            let total = total.clone();
            thread::spawn(move || {
                for i in 0..5u64 {
                    let total = total.clone();
                    handle.enqueue_action(format!("worker{}-{}", worker, i), move || {
                        assert_eq!(thread::current().id(), main);
                        *total.lock() += worker * 10 + i;
                    });
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    // 20 actions at 10 per frame
    engine.update(0.016);
    assert_eq!(engine.dispatcher().pending(), 10);
    engine.update(0.016);
    assert_eq!(engine.dispatcher().pending(), 0);

    assert_eq!(*total.lock(), (0..4).map(|w| w * 50 + 10).sum::<u64>());
    let stats = engine.diagnostics().dispatcher.unwrap();
    assert_eq!(stats.total_executed, 20);
    assert_eq!(stats.total_failed, 0);
}

//! The task executor: queue semantics, `parallel_for`, panic delivery.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shoal::parallel::ThreadPool;

#[test]
fn tasks_run_and_wait_observes_completion() {
    let pool = ThreadPool::with_workers(2);
    let counter = Arc::new(AtomicUsize::new(0));

    let handles = (0..16)
        .map(|_| {
            let counter = Arc::clone(&counter);
            pool.add_task(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect::<Vec<_>>();
    for handle in &handles {
        handle.wait();
        assert!(handle.is_ready());
    }
    assert_eq!(counter.load(Ordering::SeqCst), 16);
}

#[test]
fn add_task_if_free_refuses_when_saturated() {
    let pool = ThreadPool::with_workers(1);
    let release = Arc::new(AtomicUsize::new(0));

    let blocker = {
        let release = Arc::clone(&release);
        pool.add_task(move || {
            while release.load(Ordering::SeqCst) == 0 {
                std::thread::yield_now();
            }
        })
    };

    // Wait until the only worker has picked the blocker up.
    std::thread::sleep(Duration::from_millis(50));
    assert!(pool.add_task_if_free(|| {}).is_none(), "no worker should be free");

    release.store(1, Ordering::SeqCst);
    blocker.wait();

    // Once the worker is idle again, reservation succeeds.
    let accepted = loop {
        if let Some(handle) = pool.add_task_if_free(|| {}) {
            break handle;
        }
        std::thread::sleep(Duration::from_millis(5));
    };
    accepted.wait();
}

#[test]
fn parallel_for_covers_every_index_once() {
    let pool = ThreadPool::with_workers(4);
    let slots = (0..1000).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>();

    pool.parallel_for(0..1000, |range| {
        for index in range {
            slots[index].fetch_add(index + 1, Ordering::SeqCst);
        }
    });

    for (index, slot) in slots.iter().enumerate() {
        assert_eq!(slot.load(Ordering::SeqCst), index + 1, "slot {index}");
    }
}

#[test]
fn parallel_for_on_an_empty_range_is_a_no_op() {
    let pool = ThreadPool::with_workers(2);
    pool.parallel_for(5..5, |_| unreachable!("no chunks expected"));
}

#[test]
#[should_panic(expected = "boom")]
fn worker_panics_rethrow_at_wait() {
    let pool = ThreadPool::with_workers(1);
    let handle = pool.add_task(|| panic!("boom"));
    handle.wait();
}

#[test]
fn dropping_the_pool_discards_queued_tasks() {
    let executed = Arc::new(AtomicUsize::new(0));
    {
        let pool = ThreadPool::with_workers(1);
        for _ in 0..64 {
            let executed = Arc::clone(&executed);
            pool.add_task(move || {
                std::thread::sleep(Duration::from_millis(2));
                executed.fetch_add(1, Ordering::SeqCst);
            });
        }
        // The pool drops here; whatever is still queued must be discarded
        // without hanging the join.
    }
    assert!(executed.load(Ordering::SeqCst) <= 64);
}

#[test]
fn pool_reports_its_size() {
    assert_eq!(ThreadPool::with_workers(3).size(), 3);
    assert!(ThreadPool::new().size() >= 1);
}

use std::cell::RefCell;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

/// A single slot in the queue. `next` is the only field the queue itself
/// touches; `value` is the caller's payload.
///
/// Nodes are heap-allocated once and then recycled through a per-thread
/// free list instead of being dropped, the way `memory_cache` recycles
/// `recursive_queue_node`s in the original C++ runtime this crate
/// descends from — each worker thread keeps its own cache so recycling
/// never bounces a node across cores.
struct Node<T> {
    next: AtomicPtr<Node<T>>,
    value: Option<T>,
}

impl<T> Node<T> {
    fn new(value: Option<T>) -> *mut Node<T> {
        Box::into_raw(Box::new(Node {
            next: AtomicPtr::new(ptr::null_mut()),
            value,
        }))
    }
}

thread_local! {
    static FREE_LIST: RefCell<Vec<*mut ()>> = RefCell::new(Vec::new());
}

const FREE_LIST_CAP: usize = 1024;

fn cached_node<T>(value: T) -> *mut Node<T> {
    let recycled = FREE_LIST.with(|list| list.borrow_mut().pop());
    match recycled {
        Some(raw) => {
            let node = raw as *mut Node<T>;
            unsafe {
                (*node).value = Some(value);
                (*node).next.store(ptr::null_mut(), Ordering::Relaxed);
            }
            node
        }
        None => Node::new(Some(value)),
    }
}

fn recycle_node<T>(node: *mut Node<T>) {
    FREE_LIST.with(|list| {
        let mut list = list.borrow_mut();
        if list.len() < FREE_LIST_CAP {
            list.push(node as *mut ());
            return;
        }
        drop(list);
        unsafe {
            drop(Box::from_raw(node));
        }
    });
}

/// Lock-free multi-producer, single-consumer intrusive queue (Michael-Scott
/// style). Producers exchange the tail pointer atomically; the single
/// consumer walks `next` links from a stable head.
///
/// The queue always holds one extra sentinel node so `head` and `tail` are
/// never null, which keeps `push`/`try_pop` branch-free on the empty case.
pub struct Queue<T> {
    head: AtomicPtr<Node<T>>,
    tail: AtomicPtr<Node<T>>,
}

unsafe impl<T: Send> Send for Queue<T> {}
unsafe impl<T: Send> Sync for Queue<T> {}

impl<T> Queue<T> {
    pub fn new() -> Self {
        let sentinel = Node::new(None);
        Queue {
            head: AtomicPtr::new(sentinel),
            tail: AtomicPtr::new(sentinel),
        }
    }

    /// Enqueues `value`, returning whether this push was the one that found
    /// the queue empty (i.e. whether the caller is responsible for waking a
    /// sleeping consumer). The emptiness check is a snapshot taken before
    /// the tail swap, which is all the mailbox's double-check protocol
    /// needs: at worst it triggers one redundant wake-up, it never misses
    /// one.
    pub fn push_returning_was_empty(&self, value: T) -> bool {
        let head_snapshot = self.head.load(Ordering::Acquire);
        let node = cached_node(value);
        let prev = self.tail.swap(node, Ordering::AcqRel);
        unsafe {
            (*prev).next.store(node, Ordering::Release);
        }
        prev == head_snapshot
    }

    pub fn push(&self, value: T) {
        let _ = self.push_returning_was_empty(value);
    }

    /// Single-consumer dequeue. Not safe to call from more than one thread
    /// concurrently; the mailbox and scheduler run-queue both uphold that
    /// by construction (exactly one resumer / one worker loop owns the pop
    /// side at a time).
    pub fn try_pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Acquire);
        let next = unsafe { (*head).next.load(Ordering::Acquire) };
        if next.is_null() {
            return None;
        }
        let value = unsafe { (*next).value.take() };
        self.head.store(next, Ordering::Release);
        recycle_node(head);
        value
    }

    pub fn is_empty(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        unsafe { (*head).next.load(Ordering::Acquire).is_null() }
    }
}

impl<T> Drop for Queue<T> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
        let head = self.head.load(Ordering::Acquire);
        unsafe {
            drop(Box::from_raw(head));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Queue;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fifo_single_producer() {
        let q = Queue::new();
        for i in 0..100 {
            q.push(i);
        }
        for i in 0..100 {
            assert_eq!(q.try_pop(), Some(i));
        }
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn multi_producer_preserves_multiset() {
        let q = Arc::new(Queue::new());
        let producers = 8;
        let per_producer = 2000;
        let handles: Vec<_> = (0..producers)
            .map(|p| {
                let q = q.clone();
                thread::spawn(move || {
                    for i in 0..per_producer {
                        q.push(p * per_producer + i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut seen = Vec::with_capacity(producers * per_producer);
        while let Some(v) = q.try_pop() {
            seen.push(v);
        }
        seen.sort_unstable();
        let expected: Vec<_> = (0..(producers * per_producer)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn empty_reporting() {
        let q: Queue<u32> = Queue::new();
        assert!(q.is_empty());
        q.push(1);
        assert!(!q.is_empty());
        q.try_pop();
        assert!(q.is_empty());
    }
}

//! Single-value actor.
//!
//! The actor owns a `Mutable<T>` and the task that writes it. The UI only
//! reads through [`Actor::signal`]. The processor runs on the browser's
//! single thread, so it may hold `Rc` state and DOM handles.

use std::future::Future;
use std::rc::Rc;
use zoon::{Mutable, Signal, Task, TaskHandle};

#[derive(Clone)]
pub struct Actor<T>
where
    T: Clone + 'static,
{
    state: Mutable<T>,
    // keeps the processor alive as long as any clone exists
    _task_handle: Rc<TaskHandle>,
}

impl<T> Actor<T>
where
    T: Clone + 'static,
{
    /// Starts `processor` with a handle to the state it owns.
    pub fn new<F, Fut>(initial_state: T, processor: F) -> Self
    where
        F: FnOnce(Mutable<T>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let state = Mutable::new(initial_state);
        let task_handle = Rc::new(Task::start_droppable(processor(state.clone())));
        Self {
            state,
            _task_handle: task_handle,
        }
    }

    pub fn signal(&self) -> impl Signal<Item = T> + use<T> {
        self.state.signal_cloned()
    }
}

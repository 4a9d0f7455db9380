//! # Cooperative Task Scheduler
//!
//! Logical-time, single-threaded timers. Nothing here reads a clock: the
//! driving loop passes the sample tick into [`Scheduler::execute`] once per
//! sample and every task whose due tick has been passed runs right there,
//! in list order.
//!
//! A task is plain data (`T`), not a closure. The owner matches on it inside
//! the `execute` callback, which keeps the borrow of the owner's other state
//! disjoint from the scheduler itself.

/// Identifier handed out by [`Scheduler::schedule`].
pub type TaskId = u32;

#[derive(Debug, Clone)]
struct ScheduledTask<T> {
    id: TaskId,
    task: T,
    /// 0 for a one-shot task
    period: f64,
    offset: f64,
    due: f64,
}

/// First tick at which a periodic task is due: the next `period` boundary
/// strictly past `tick`, shifted by `offset`.
pub fn next_due(tick: f64, period: f64, offset: f64) -> f64 {
    (tick / period).floor() * period + period + offset
}

#[derive(Debug)]
pub struct Scheduler<T> {
    tasks: Vec<ScheduledTask<T>>,
    next_id: TaskId,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Scheduler {
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// Add a task. `period == 0` makes it a one-shot due at `tick + offset`.
    pub fn schedule(&mut self, task: T, tick: f64, period: f64, offset: f64) -> TaskId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let due = if period > 0.0 {
            next_due(tick, period, offset)
        } else {
            tick + offset
        };
        self.tasks.push(ScheduledTask {
            id,
            task,
            period,
            offset,
            due,
        });
        id
    }

    /// Remove a task. Unknown ids are ignored; returns whether anything was removed.
    pub fn unschedule(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Due tick of a scheduled task.
    pub fn due(&self, id: TaskId) -> Option<f64> {
        self.tasks.iter().find(|t| t.id == id).map(|t| t.due)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<T: Clone> Scheduler<T> {
    /// Run every task whose due tick is strictly before `tick`.
    ///
    /// Periodic tasks are re-armed with [`next_due`] under the same id and
    /// move to the end of the list, behind anything scheduled after them.
    /// Returns how many tasks fired.
    pub fn execute<F>(&mut self, tick: f64, mut run: F) -> usize
    where
        F: FnMut(T, f64),
    {
        let mut fired = 0;
        let mut index = 0;
        // re-armed tasks are appended; only look at what was queued on entry
        for _ in 0..self.tasks.len() {
            if self.tasks[index].due >= tick {
                index += 1;
                continue;
            }

            let mut entry = self.tasks.remove(index);
            let task = entry.task.clone();
            if entry.period > 0.0 {
                entry.due = next_due(tick, entry.period, entry.offset);
                self.tasks.push(entry);
            }

            run(task, tick);
            fired += 1;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_task_aligns_to_boundary_plus_offset() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule("tick", 0.0, 5.0, 2.0);
        assert_eq!(scheduler.due(id), Some(7.0));

        let mut fired = Vec::new();
        for tick in 0..19 {
            scheduler.execute(tick as f64, |_, t| fired.push(t));
        }
        assert_eq!(fired, vec![8.0, 13.0, 18.0]);
        assert_eq!(scheduler.due(id), Some(22.0));
    }

    #[test]
    fn one_shot_fires_once_then_disappears() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(1u8, 10.0, 0.0, 4.2);
        assert_eq!(scheduler.due(id), Some(14.2));

        assert_eq!(scheduler.execute(14.2, |_, _| {}), 0);
        assert_eq!(scheduler.execute(14.3, |_, _| {}), 1);
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.execute(100.0, |_, _| {}), 0);
    }

    #[test]
    fn unknown_id_is_a_noop() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule((), 0.0, 0.0, 1.0);
        assert!(!scheduler.unschedule(id + 100));
        assert!(scheduler.unschedule(id));
        assert!(!scheduler.unschedule(id));
    }

    #[test]
    fn ids_stay_unique() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.schedule('a', 0.0, 1.0, 0.0);
        let b = scheduler.schedule('b', 0.0, 0.0, 1.0);
        scheduler.execute(5.0, |_, _| {});
        let c = scheduler.schedule('c', 5.0, 0.0, 1.0);
        assert!(a != b && b != c && a != c);
        assert!(scheduler.is_scheduled(a));
        assert!(!scheduler.is_scheduled(b));
    }

    #[test]
    fn tasks_run_in_list_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule("first", 0.0, 0.0, 1.0);
        scheduler.schedule("second", 0.0, 0.0, 0.5);
        scheduler.schedule("third", 0.0, 2.0, 0.0);

        let mut order = Vec::new();
        scheduler.execute(3.0, |task, _| order.push(task));
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn rearmed_periodic_task_runs_after_later_one_shots() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule("summary", 0.0, 1.0, 0.0);
        scheduler.schedule("cluster", 0.0, 0.0, 5.0);

        let mut order = Vec::new();
        scheduler.execute(2.0, |task, _| order.push(task));
        assert_eq!(order, vec!["summary"]);

        order.clear();
        scheduler.execute(6.0, |task, _| order.push(task));
        assert_eq!(order, vec!["cluster", "summary"]);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn rearmed_task_fires_once_per_execute() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule("fast", 0.0, 0.5, 0.0);
        assert_eq!(scheduler.execute(10.0, |_, _| {}), 1);
        assert_eq!(scheduler.execute(10.2, |_, _| {}), 0);
        assert_eq!(scheduler.execute(10.6, |_, _| {}), 1);
    }
}

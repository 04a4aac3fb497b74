//! Single-pass history capture for sequence inputs.

use std::cell::RefCell;
use std::rc::Rc;

use super::History;

/// Implemented by anything that carries a provenance record.
pub trait HasHistory {
    /// Borrow the attached history, if any.
    fn history(&self) -> Option<&History>;

    /// Detach and return the attached history.
    fn take_history(&mut self) -> Option<History>;

    /// Attach a history, replacing any previous record.
    fn set_history(&mut self, history: History);
}

/// Collects the histories of elements streaming through an operation.
///
/// The operation algebra consumes its sequence input exactly once, so the
/// collector interposes a pass-through iterator ([`Observed`]) that detaches
/// each element's history into a shared side list as the element flows by.
#[derive(Default)]
pub struct HistoryCollector {
    collected: Rc<RefCell<Vec<History>>>,
}

impl HistoryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `iter` so that every element yielded is also recorded here.
    pub fn observe<I>(&self, iter: I) -> Observed<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: HasHistory,
    {
        Observed {
            inner: iter.into_iter(),
            collected: Rc::clone(&self.collected),
        }
    }

    /// The histories seen so far, in stream order.
    pub fn take(&self) -> Vec<History> {
        std::mem::take(&mut self.collected.borrow_mut())
    }
}

/// Pass-through iterator feeding a [`HistoryCollector`].
pub struct Observed<I> {
    inner: I,
    collected: Rc<RefCell<Vec<History>>>,
}

impl<I> Iterator for Observed<I>
where
    I: Iterator,
    I::Item: HasHistory,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let mut item = self.inner.next()?;
        let history = item
            .take_history()
            .unwrap_or_else(|| History::new("<unknown>"));
        self.collected.borrow_mut().push(history);
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tagged {
        value: u32,
        history: Option<History>,
    }

    impl HasHistory for Tagged {
        fn history(&self) -> Option<&History> {
            self.history.as_ref()
        }
        fn take_history(&mut self) -> Option<History> {
            self.history.take()
        }
        fn set_history(&mut self, history: History) {
            self.history = Some(history);
        }
    }

    #[test]
    fn test_observe_captures_in_stream_order_without_second_pass() {
        let items = vec![
            Tagged { value: 1, history: Some(History::new("one")) },
            Tagged { value: 2, history: Some(History::new("two")) },
        ];
        let collector = HistoryCollector::new();
        let seen: Vec<u32> = collector.observe(items).map(|t| t.value).collect();

        assert_eq!(seen, vec![1, 2]);
        let histories = collector.take();
        assert_eq!(histories.len(), 2);
        assert_eq!(histories[0].operation, "one");
        assert_eq!(histories[1].operation, "two");
    }

    #[test]
    fn test_observe_is_lazy() {
        let items = vec![
            Tagged { value: 1, history: None },
            Tagged { value: 2, history: None },
        ];
        let collector = HistoryCollector::new();
        let mut iter = collector.observe(items);
        assert_eq!(collector.take().len(), 0);
        iter.next();
        assert_eq!(collector.take().len(), 1);
    }

    #[test]
    fn test_history_less_item_recorded_as_unknown() {
        let items = vec![Tagged { value: 9, history: None }];
        let collector = HistoryCollector::new();
        let _: Vec<_> = collector.observe(items).collect();
        assert_eq!(collector.take()[0].operation, "<unknown>");
    }
}

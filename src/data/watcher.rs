//! Registers one set of observers against many data instances.

use crate::data::Observable;
use crate::observers::{DataObserver, ErrorObserver, LoadingObserver};
use std::rc::Rc;

struct Watched {
    data: Rc<dyn Observable>,
    registered: bool,
}

/// Keeps a data, loading and error observer registered against a set of data
/// instances while enabled. Toggling never registers twice.
pub struct DataWatcher {
    data_observer: Rc<dyn DataObserver>,
    loading_observer: Rc<dyn LoadingObserver>,
    error_observer: Rc<dyn ErrorObserver>,
    watched: Vec<Watched>,
    enabled: bool,
}

impl DataWatcher {
    pub fn new(
        data_observer: Rc<dyn DataObserver>,
        loading_observer: Rc<dyn LoadingObserver>,
        error_observer: Rc<dyn ErrorObserver>,
    ) -> Self {
        Self {
            data_observer,
            loading_observer,
            error_observer,
            watched: Vec::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.update_registration();
        }
    }

    /// Replace the watched set, unregistering from instances that left it
    pub fn set_datas(&mut self, datas: impl IntoIterator<Item = Rc<dyn Observable>>) {
        let mut next: Vec<Watched> = Vec::new();
        for data in datas {
            if next.iter().any(|w| Rc::ptr_eq(&w.data, &data)) {
                continue;
            }
            let registered = self
                .watched
                .iter()
                .any(|w| w.registered && Rc::ptr_eq(&w.data, &data));
            next.push(Watched { data, registered });
        }

        for old in std::mem::take(&mut self.watched) {
            let kept = next.iter().any(|w| Rc::ptr_eq(&w.data, &old.data));
            if old.registered && !kept {
                self.unregister(&old.data);
            }
        }

        self.watched = next;
        self.update_registration();
    }

    fn update_registration(&mut self) {
        let enabled = self.enabled;
        for index in 0..self.watched.len() {
            let registered = self.watched[index].registered;
            let data = self.watched[index].data.clone();
            if registered && !enabled {
                self.unregister(&data);
                self.watched[index].registered = false;
            } else if !registered && enabled {
                self.register(&data);
                self.watched[index].registered = true;
            }
        }
    }

    fn register(&self, data: &Rc<dyn Observable>) {
        data.register_data_observer(self.data_observer.clone());
        data.register_loading_observer(self.loading_observer.clone());
        data.register_error_observer(self.error_observer.clone());
    }

    fn unregister(&self, data: &Rc<dyn Observable>) {
        data.unregister_data_observer(&self.data_observer);
        data.unregister_loading_observer(&self.loading_observer);
        data.unregister_error_observer(&self.error_observer);
    }
}

impl Drop for DataWatcher {
    fn drop(&mut self) {
        self.set_enabled(false);
    }
}

impl std::fmt::Debug for DataWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataWatcher")
            .field("watched", &self.watched.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ListData;
    use crate::observers::Recorder;

    fn watcher(recorder: &Rc<Recorder>) -> DataWatcher {
        DataWatcher::new(recorder.clone(), recorder.clone(), recorder.clone())
    }

    #[test]
    fn test_enable_toggles_registration() {
        let list = ListData::from_vec(vec![1]);
        let recorder = Recorder::new();
        let mut watcher = watcher(&recorder);
        watcher.set_datas([list.clone() as Rc<dyn Observable>]);

        list.push(2);
        assert!(recorder.changes().is_empty());

        watcher.set_enabled(true);
        watcher.set_enabled(true);
        list.push(3);
        assert_eq!(recorder.changes().len(), 1);

        watcher.set_enabled(false);
        list.push(4);
        assert_eq!(recorder.changes().len(), 1);
    }

    #[test]
    fn test_set_datas_unregisters_dropped_instances() {
        let first = ListData::from_vec(vec![1]);
        let second = ListData::from_vec(vec![1]);
        let recorder = Recorder::new();
        let mut watcher = watcher(&recorder);
        watcher.set_enabled(true);
        watcher.set_datas([first.clone() as Rc<dyn Observable>]);
        watcher.set_datas([
            first.clone() as Rc<dyn Observable>,
            second.clone() as Rc<dyn Observable>,
        ]);
        watcher.set_datas([second.clone() as Rc<dyn Observable>]);

        first.push(2);
        second.push(2);
        assert_eq!(recorder.changes().len(), 1);
    }
}

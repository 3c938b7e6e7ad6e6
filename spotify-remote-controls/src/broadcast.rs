use std::{
    collections::HashMap,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex},
};

use tokio::{sync::mpsc::UnboundedReceiver, task::JoinHandle};
use tracing::{debug, error};

use crate::events::{Event, EventKind};

type Callback = Box<dyn Fn(&Event) + Send + Sync>;

/// Fan-out point for poller events, owned by the bridge.
///
/// Subscribers register per event kind and are invoked in subscription order.
/// There is no unsubscribe; subscribers live as long as the bridge does.
pub struct EventBus {
    subscribers: Mutex<HashMap<EventKind, Vec<Callback>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe<F>(&self, kind: EventKind, callback: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        debug!("subscribing callback to {kind:?}");
        self.subscribers
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push(Box::new(callback));
    }

    pub(crate) fn dispatch(&self, event: &Event) {
        let subscribers = self.subscribers.lock().unwrap();
        let Some(callbacks) = subscribers.get(&event.kind()) else {
            return;
        };

        for callback in callbacks {
            // A faulty subscriber must not starve the ones after it.
            if std::panic::catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                error!("a subscriber callback for {:?} panicked", event.kind());
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain classified events onto subscriber callbacks on a dedicated task, so
/// a slow subscriber cannot stall the polling loop.
pub(crate) fn spawn_event_consumer(
    bus: Arc<EventBus>,
    mut events: UnboundedReceiver<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            bus.dispatch(&event);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pause_event() -> Event {
        Event::Pause
    }

    #[test]
    fn callbacks_run_in_subscription_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let seen = seen.clone();
            bus.subscribe(EventKind::Pause, move |_| {
                seen.lock().unwrap().push(id);
            });
        }

        bus.dispatch(&pause_event());

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn callbacks_only_see_their_own_kind() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let pauses = seen.clone();
        bus.subscribe(EventKind::Pause, move |_| {
            pauses.lock().unwrap().push("pause");
        });
        let stops = seen.clone();
        bus.subscribe(EventKind::Stop, move |_| {
            stops.lock().unwrap().push("stop");
        });

        bus.dispatch(&pause_event());

        assert_eq!(*seen.lock().unwrap(), vec!["pause"]);
    }

    #[test]
    fn a_panicking_callback_does_not_starve_later_subscribers() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe(EventKind::Pause, |_| panic!("faulty subscriber"));
        let survivors = seen.clone();
        bus.subscribe(EventKind::Pause, move |_| {
            survivors.lock().unwrap().push("survivor");
        });

        bus.dispatch(&pause_event());
        bus.dispatch(&pause_event());

        assert_eq!(*seen.lock().unwrap(), vec!["survivor", "survivor"]);
    }
}

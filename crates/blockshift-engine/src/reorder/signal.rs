/// Handle returned by [`DragActivity::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(bool)>;

/// Observable "a block drag is in progress" flag
///
/// Subsystems that must behave differently while a block is being dragged
/// (hover toolbars, selection bubbles) subscribe here instead of sniffing
/// presentation attributes. Listeners hear about changes only, never repeats.
#[derive(Default)]
pub struct DragActivity {
    active: bool,
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl DragActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn subscribe(&mut self, listener: impl FnMut(bool) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when the subscription was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub(crate) fn set(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        for (_, listener) in &mut self.listeners {
            listener(active);
        }
    }
}

impl std::fmt::Debug for DragActivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragActivity")
            .field("active", &self.active)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

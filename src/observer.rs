//! Field change notifications (component C7).

/// Receives synchronous notifications from the Apply and death-sweep phases.
/// Implementations must not mutate the `Field` that calls them; the only
/// permitted side effect is maintaining external shadow state (e.g. a render
/// cache or a UI event log).
pub trait Observer {
    fn handle_bot_moved(&mut self, from: (i32, i32), to: (i32, i32));
    fn handle_bot_died(&mut self, at: (i32, i32));
}

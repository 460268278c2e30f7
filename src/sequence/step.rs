//! Contracts for the things a sequence presents and where it presents them

/// The application presenting a sequence
pub trait Host {
    /// True once the host is being torn down and can no longer present steps
    fn is_finishing(&self) -> bool;
}

impl<H: Host + ?Sized> Host for &mut H {
    fn is_finishing(&self) -> bool {
        (**self).is_finishing()
    }
}

/// One renderable overlay in a sequence.
///
/// Rendering itself is the step's business; the sequence only needs to know
/// whether it worked and how the step was closed.
pub trait Step<H: ?Sized> {
    /// Render over `host`. Returns false if the step could not be shown
    /// (target missing, host unsuitable).
    fn show(&mut self, host: &mut H) -> bool;

    /// Mark as shown without rendering
    fn set_fired(&mut self);

    /// Whether the user closed this step with the "skip the rest" action
    fn is_skipped(&self) -> bool;

    /// Called with `true` while a sequence is waiting on this step's detach
    /// and `false` once it stops listening.
    fn set_detach_observed(&mut self, _observed: bool) {}
}

impl<H: ?Sized, S: Step<H> + ?Sized> Step<H> for Box<S> {
    fn show(&mut self, host: &mut H) -> bool {
        (**self).show(host)
    }

    fn set_fired(&mut self) {
        (**self).set_fired();
    }

    fn is_skipped(&self) -> bool {
        (**self).is_skipped()
    }

    fn set_detach_observed(&mut self, observed: bool) {
        (**self).set_detach_observed(observed);
    }
}

/// Gate evaluated right before a step would be shown
pub type Predicate<S> = Box<dyn Fn(&S) -> bool>;

/// Default gate: show every step
pub fn always_show<S: ?Sized>(_step: &S) -> bool {
    true
}

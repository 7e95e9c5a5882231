//! Ambient per-thread request context.
//!
//! Request-handling code sets the current request id and user id when a
//! request starts and clears them when it ends; the layer reads them as
//! fallbacks for events that did not carry those fields explicitly.

use std::cell::RefCell;

thread_local! {
    static REQUEST_ID: RefCell<Option<String>> = RefCell::new(None);
    static USER_ID: RefCell<Option<String>> = RefCell::new(None);
}

pub fn set_request_id(id: impl Into<String>) {
    REQUEST_ID.with(|slot| *slot.borrow_mut() = Some(id.into()));
}

pub fn get_request_id() -> Option<String> {
    REQUEST_ID.with(|slot| slot.borrow().clone())
}

pub fn set_user_id(id: impl Into<String>) {
    USER_ID.with(|slot| *slot.borrow_mut() = Some(id.into()));
}

pub fn get_user_id() -> Option<String> {
    USER_ID.with(|slot| slot.borrow().clone())
}

/// Reset both slots, typically at the end of a request.
pub fn clear() {
    REQUEST_ID.with(|slot| *slot.borrow_mut() = None);
    USER_ID.with(|slot| *slot.borrow_mut() = None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_clear_round_trip() {
        clear();
        assert_eq!(get_request_id(), None);

        set_request_id("req-1");
        set_user_id("u-1");
        assert_eq!(get_request_id().as_deref(), Some("req-1"));
        assert_eq!(get_user_id().as_deref(), Some("u-1"));

        clear();
        assert_eq!(get_request_id(), None);
        assert_eq!(get_user_id(), None);
    }

    #[test]
    fn context_is_per_thread() {
        set_request_id("req-main");
        let other = std::thread::spawn(get_request_id)
            .join()
            .expect("context thread");
        assert_eq!(other, None);
        clear();
    }
}

//! System color scheme bindings.
//!
//! One [`ThemeHub`] per page. A [`JsThemeWatcher`] attaches a
//! `prefers-color-scheme` listener on `mount` and detaches it on `unmount`
//! (or when freed), so no listener outlives the view that registered it.
//!
//! JS callbacks run after the hub is released, so a callback may mount or
//! unmount watchers, its own included.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rawcrop_core::{ColorScheme, SubscriptionId, ThemeHub};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MediaQueryList, MediaQueryListEvent};

const DARK_QUERY: &str = "(prefers-color-scheme: dark)";

type Deferred = Box<dyn FnOnce()>;

thread_local! {
    static HUB: RefCell<ThemeHub> = RefCell::new(ThemeHub::default());
    static CURRENT: Cell<ColorScheme> = Cell::new(ColorScheme::default());
    // Listener calls queued while HUB is borrowed.
    static PENDING: RefCell<Vec<Deferred>> = RefCell::new(Vec::new());
}

fn publish(scheme: ColorScheme) {
    CURRENT.with(|c| c.set(scheme));
    HUB.with(|hub| hub.borrow_mut().set_scheme(scheme));
    let pending = PENDING.with(|p| std::mem::take(&mut *p.borrow_mut()));
    for call in pending {
        call();
    }
}

/// Subscribe `listener` to run once `publish` has released the hub.
///
/// Calls queued for the same change are skipped once `live` is cleared.
fn subscribe_deferred(
    live: Rc<Cell<bool>>,
    listener: impl Fn(ColorScheme) + 'static,
) -> SubscriptionId {
    let listener = Rc::new(listener);
    HUB.with(|hub| {
        hub.borrow_mut().subscribe(move |scheme| {
            let listener = listener.clone();
            let live = live.clone();
            PENDING.with(|p| {
                p.borrow_mut().push(Box::new(move || {
                    if live.get() {
                        (*listener)(scheme);
                    }
                }))
            });
        })
    })
}

/// Current system color scheme: `"light"` or `"dark"`.
#[wasm_bindgen]
pub fn current_color_scheme() -> String {
    CURRENT.with(|c| c.get()).as_str().to_string()
}

/// Subscription of one view to system color scheme changes.
#[wasm_bindgen]
pub struct JsThemeWatcher {
    query: Option<MediaQueryList>,
    listener: Option<Closure<dyn FnMut(MediaQueryListEvent)>>,
    subscription: Option<SubscriptionId>,
    live: Rc<Cell<bool>>,
}

#[wasm_bindgen]
impl JsThemeWatcher {
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsThemeWatcher {
        JsThemeWatcher {
            query: None,
            listener: None,
            subscription: None,
            live: Rc::new(Cell::new(false)),
        }
    }

    /// Start watching. `callback` receives `"light"` or `"dark"` on every change.
    ///
    /// Returns the scheme at mount time. Mounting again replaces the previous
    /// subscription.
    pub fn mount(&mut self, callback: js_sys::Function) -> Result<String, JsValue> {
        self.unmount();

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let query = window
            .match_media(DARK_QUERY)?
            .ok_or_else(|| JsValue::from_str("matchMedia is not supported"))?;
        publish(ColorScheme::from_prefers_dark(query.matches()));

        let live = Rc::new(Cell::new(true));
        let id = subscribe_deferred(live.clone(), move |scheme| {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(scheme.as_str())) {
                log::warn!(
                    "Color scheme callback failed: {}",
                    crate::fetch::describe_js_error(&e)
                );
            }
        });

        let listener = Closure::<dyn FnMut(MediaQueryListEvent)>::new(
            move |event: MediaQueryListEvent| {
                publish(ColorScheme::from_prefers_dark(event.matches()));
            },
        );
        query.add_event_listener_with_callback("change", listener.as_ref().unchecked_ref())?;

        self.query = Some(query);
        self.listener = Some(listener);
        self.subscription = Some(id);
        self.live = live;
        Ok(current_color_scheme())
    }

    /// Stop watching. Safe to call when not mounted.
    pub fn unmount(&mut self) {
        self.live.set(false);
        if let (Some(query), Some(listener)) = (self.query.take(), self.listener.take()) {
            let removed = query
                .remove_event_listener_with_callback("change", listener.as_ref().unchecked_ref());
            if removed.is_err() {
                log::warn!("Could not detach color scheme listener");
            }
        }
        if let Some(id) = self.subscription.take() {
            HUB.with(|hub| hub.borrow_mut().unsubscribe(id));
        }
    }

    #[wasm_bindgen(getter)]
    pub fn mounted(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Default for JsThemeWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JsThemeWatcher {
    fn drop(&mut self) {
        self.unmount();
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_mount_unmount_releases_subscription() {
        let before = HUB.with(|hub| hub.borrow().subscriber_count());
        let mut watcher = JsThemeWatcher::new();

        let scheme = watcher.mount(js_sys::Function::new_no_args("")).unwrap();
        assert!(scheme == "light" || scheme == "dark");
        assert!(watcher.mounted());
        assert_eq!(HUB.with(|hub| hub.borrow().subscriber_count()), before + 1);

        watcher.unmount();
        assert!(!watcher.mounted());
        assert_eq!(HUB.with(|hub| hub.borrow().subscriber_count()), before);
    }

    #[wasm_bindgen_test]
    fn test_callback_can_unmount_its_watcher() {
        let before = HUB.with(|hub| hub.borrow().subscriber_count());
        let watcher = Rc::new(RefCell::new(JsThemeWatcher::new()));
        let calls = Rc::new(Cell::new(0));
        let callback = Closure::<dyn FnMut(JsValue)>::new({
            let watcher = watcher.clone();
            let calls = calls.clone();
            move |_scheme: JsValue| {
                calls.set(calls.get() + 1);
                watcher.borrow_mut().unmount();
            }
        });
        let function: js_sys::Function = callback.as_ref().unchecked_ref::<js_sys::Function>().clone();

        let mounted = watcher.borrow_mut().mount(function).unwrap();
        let (flipped, original) = if mounted == "dark" {
            (ColorScheme::Light, ColorScheme::Dark)
        } else {
            (ColorScheme::Dark, ColorScheme::Light)
        };
        publish(flipped);
        publish(original);

        assert_eq!(calls.get(), 1);
        assert!(!watcher.borrow().mounted());
        assert_eq!(HUB.with(|hub| hub.borrow().subscriber_count()), before);
    }

    #[wasm_bindgen_test]
    fn test_remount_replaces_subscription() {
        let before = HUB.with(|hub| hub.borrow().subscriber_count());
        let mut watcher = JsThemeWatcher::new();
        watcher.mount(js_sys::Function::new_no_args("")).unwrap();
        watcher.mount(js_sys::Function::new_no_args("")).unwrap();
        assert_eq!(HUB.with(|hub| hub.borrow().subscriber_count()), before + 1);
        drop(watcher);
        assert_eq!(HUB.with(|hub| hub.borrow().subscriber_count()), before);
    }
}

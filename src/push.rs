use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Uint8Array;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{BinaryType, CloseEvent, ErrorEvent, Event, MessageEvent, WebSocket};

use lastspike_core::{decode, encode, ClientMsg, NotifyMsg};

#[allow(dead_code)]
pub(crate) struct WsHandlers {
    onopen: Closure<dyn FnMut(Event)>,
    onmessage: Closure<dyn FnMut(MessageEvent)>,
    onerror: Closure<dyn FnMut(ErrorEvent)>,
    onclose: Closure<dyn FnMut(Event)>,
}

/// Notify-channel adapter. Frames carry no game state; every decoded
/// [`NotifyMsg`] only tells the runtime to re-fetch the snapshot.
#[derive(Clone)]
pub(crate) struct NotifyAdapter {
    ws: Rc<RefCell<Option<WebSocket>>>,
    handlers: Rc<RefCell<Option<WsHandlers>>>,
    closing: Rc<Cell<bool>>,
}

impl NotifyAdapter {
    pub(crate) fn new() -> Self {
        Self {
            ws: Rc::new(RefCell::new(None)),
            handlers: Rc::new(RefCell::new(None)),
            closing: Rc::new(Cell::new(false)),
        }
    }

    pub(crate) fn connect(
        &mut self,
        url: &str,
        session_id: &str,
        on_notify: Rc<dyn Fn(NotifyMsg)>,
        on_fail: Rc<dyn Fn()>,
    ) {
        self.disconnect();
        let closing = Rc::new(Cell::new(false));
        self.closing = closing.clone();

        let url = url.trim();
        if url.is_empty() {
            return;
        }

        let ws = match WebSocket::new(url) {
            Ok(ws) => ws,
            Err(_) => {
                gloo::console::warn!("failed to open notify socket", url);
                on_fail();
                return;
            }
        };
        ws.set_binary_type(BinaryType::Arraybuffer);
        *self.ws.borrow_mut() = Some(ws.clone());

        let opened = Rc::new(Cell::new(false));
        let onopen = {
            let opened = opened.clone();
            let url = url.to_string();
            let ws = ws.clone();
            let session_id = session_id.to_string();
            Closure::wrap(Box::new(move |_event: Event| {
                opened.set(true);
                gloo::console::log!("notify socket connected", url.clone());
                if let Some(bytes) = encode(&ClientMsg::Subscribe {
                    session_id: session_id.clone(),
                }) {
                    let _ = ws.send_with_u8_array(&bytes);
                }
            }) as Box<dyn FnMut(Event)>)
        };
        let onmessage = {
            let on_notify = on_notify.clone();
            Closure::wrap(Box::new(move |event: MessageEvent| {
                let data = event.data();
                let Ok(buffer) = data.dyn_into::<js_sys::ArrayBuffer>() else {
                    return;
                };
                let bytes = Uint8Array::new(&buffer).to_vec();
                if let Some(msg) = decode::<NotifyMsg>(&bytes) {
                    on_notify(msg);
                }
            }) as Box<dyn FnMut(MessageEvent)>)
        };
        let onerror = {
            let url = url.to_string();
            Closure::wrap(Box::new(move |_event: ErrorEvent| {
                gloo::console::warn!("notify socket error", url.clone());
            }) as Box<dyn FnMut(ErrorEvent)>)
        };
        let onclose = {
            let ws_ref = self.ws.clone();
            let handlers_ref = self.handlers.clone();
            let opened = opened.clone();
            let url = url.to_string();
            let on_fail = on_fail.clone();
            let closing = closing.clone();
            Closure::wrap(Box::new(move |event: Event| {
                ws_ref.borrow_mut().take();
                handlers_ref.borrow_mut().take();
                if closing.get() {
                    return;
                }
                if !opened.get() {
                    gloo::console::warn!("notify socket failed to connect", url.clone());
                    on_fail();
                    return;
                }
                if let Some(close) = event.dyn_ref::<CloseEvent>() {
                    let reason = close.reason();
                    if reason.is_empty() {
                        gloo::console::log!("notify socket closed", url.clone(), close.code());
                    } else {
                        gloo::console::log!("notify socket closed", url.clone(), close.code(), reason);
                    }
                } else {
                    gloo::console::log!("notify socket closed", url.clone());
                }
                on_fail();
            }) as Box<dyn FnMut(Event)>)
        };

        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        *self.handlers.borrow_mut() = Some(WsHandlers {
            onopen,
            onmessage,
            onerror,
            onclose,
        });
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.ws
            .borrow()
            .as_ref()
            .map(|ws| ws.ready_state() == WebSocket::OPEN)
            .unwrap_or(false)
    }

    pub(crate) fn disconnect(&mut self) {
        self.closing.set(true);
        self.handlers.borrow_mut().take();
        if let Some(ws) = self.ws.borrow_mut().take() {
            let _ = ws.close();
        }
    }
}

impl Default for NotifyAdapter {
    fn default() -> Self {
        Self::new()
    }
}

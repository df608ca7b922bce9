//! Identity provider backed by the wallet the browser injects as `window.ethereum`.
//!
//! Push-events are registered with `on(...)` while connected and removed again with
//! `removeListener(...)`. The closures forward into the storefront installed in `app`.

use async_trait::async_trait;
use js_sys::{Function, Object, Promise, Reflect};
use nm_api_types::{AccountId, ProviderEvent};
use nm_provider_client::{IdentityError, IdentityProvider};
use std::cell::RefCell;
use std::fmt::Display;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::app;
use crate::dom;

pub const NO_WALLET: &str = "Please install a Web3 wallet to connect";
/// EIP-1193 code for a request the user declined.
const USER_REJECTED_CODE: f64 = 4001.0;

struct Listeners {
    accounts_changed: Closure<dyn FnMut(JsValue)>,
    chain_changed: Closure<dyn FnMut(JsValue)>,
}

#[derive(Default)]
pub struct EthereumProvider {
    listeners: RefCell<Option<Listeners>>,
}

fn ethereum() -> Option<JsValue> {
    let value = Reflect::get(&dom::window(), &JsValue::from_str("ethereum")).ok()?;
    (!value.is_undefined() && !value.is_null()).then_some(value)
}

fn method(target: &JsValue, name: &str) -> Result<Function, JsValue> {
    Reflect::get(target, &JsValue::from_str(name))?.dyn_into::<Function>()
}

fn error_message(err: &JsValue) -> String {
    Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_else(|| "wallet request failed".to_string())
}

fn identity_error(err: JsValue) -> IdentityError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64());
    let message = error_message(&err);
    if code == Some(USER_REJECTED_CODE) {
        IdentityError::UserRejected(message)
    } else {
        IdentityError::ProviderUnavailable(message)
    }
}

fn parse_accounts(value: JsValue) -> Result<Vec<AccountId>, IdentityError> {
    accounts_from(serde_wasm_bindgen::from_value(value))
}

fn accounts_from<E: Display>(raw: Result<Vec<String>, E>) -> Result<Vec<AccountId>, IdentityError> {
    raw.map(|raw| raw.into_iter().map(AccountId).collect())
        .map_err(|e| IdentityError::ProviderUnavailable(format!("unexpected accounts payload: {e}")))
}

/// An unreadable payload is an error, never an empty list: the core reads empty as a disconnect.
fn accounts_changed_event<E: Display>(raw: Result<Vec<String>, E>) -> Result<ProviderEvent, IdentityError> {
    accounts_from(raw).map(|accounts| ProviderEvent::AccountsChanged { accounts })
}

#[async_trait(?Send)]
impl IdentityProvider for EthereumProvider {
    async fn request_accounts(&self) -> Result<Vec<AccountId>, IdentityError> {
        let provider = ethereum().ok_or_else(|| IdentityError::ProviderUnavailable(NO_WALLET.into()))?;

        let args = Object::new();
        Reflect::set(
            &args,
            &JsValue::from_str("method"),
            &JsValue::from_str("eth_requestAccounts"),
        )
        .map_err(identity_error)?;

        let request = method(&provider, "request").map_err(identity_error)?;
        let promise: Promise = request
            .call1(&provider, &args)
            .map_err(identity_error)?
            .dyn_into()
            .map_err(|_| IdentityError::ProviderUnavailable("wallet request did not return a promise".into()))?;

        let accounts = JsFuture::from(promise).await.map_err(identity_error)?;
        parse_accounts(accounts)
    }

    fn subscribe(&self) {
        let Some(provider) = ethereum() else {
            return;
        };
        if self.listeners.borrow().is_some() {
            return;
        }

        let accounts_changed = Closure::wrap(Box::new(|value: JsValue| {
            match accounts_changed_event(serde_wasm_bindgen::from_value(value)) {
                Ok(event) => app::raise_event(event),
                Err(err) => gloo_console::warn!(format!("accountsChanged dropped: {err}")),
            }
        }) as Box<dyn FnMut(JsValue)>);
        let chain_changed = Closure::wrap(Box::new(|_: JsValue| {
            app::raise_event(ProviderEvent::ChainChanged);
        }) as Box<dyn FnMut(JsValue)>);

        match method(&provider, "on") {
            Ok(on) => {
                let _ = on.call2(&provider, &"accountsChanged".into(), accounts_changed.as_ref());
                let _ = on.call2(&provider, &"chainChanged".into(), chain_changed.as_ref());
            }
            Err(err) => gloo_console::warn!("wallet has no on()", err),
        }

        *self.listeners.borrow_mut() = Some(Listeners {
            accounts_changed,
            chain_changed,
        });
    }

    fn unsubscribe(&self) {
        let Some(listeners) = self.listeners.borrow_mut().take() else {
            return;
        };
        let Some(provider) = ethereum() else {
            return;
        };
        if let Ok(remove) = method(&provider, "removeListener") {
            let _ = remove.call2(
                &provider,
                &"accountsChanged".into(),
                listeners.accounts_changed.as_ref(),
            );
            let _ = remove.call2(&provider, &"chainChanged".into(), listeners.chain_changed.as_ref());
        }
    }
}

//! Applies render instructions to the page.

use gloo_timers::callback::Timeout;
use nm_api_types::{Notice, NoticeKind, RenderInstruction, SessionBadge};
use nm_provider_client::Presenter;
use wasm_bindgen::JsCast;

use crate::dom::{self, Elements};
use crate::markup;

const TOAST_MS: u32 = 3_000;
const FADE_MS: u32 = 300;

pub struct DomPresenter {
    els: Elements,
}

impl DomPresenter {
    pub fn new(els: Elements) -> Self {
        Self { els }
    }

    fn badge(&self, badge: &SessionBadge) {
        let connected = matches!(badge, SessionBadge::Connected { .. });
        dom::set_display(&self.els.connect_wallet, if connected { "none" } else { "block" });
        dom::set_display(&self.els.disconnect_wallet, if connected { "block" } else { "none" });
        dom::set_display(&self.els.wallet_info, if connected { "flex" } else { "none" });

        match badge {
            SessionBadge::Connected { account_id, short } => {
                self.els.wallet_address.set_text_content(Some(short));
                let _ = self.els.wallet_address.set_attribute("title", &account_id.0);
            }
            _ => self.els.wallet_address.set_text_content(None),
        }
        let _ = self
            .els
            .connect_wallet
            .toggle_attribute_with_force("disabled", matches!(badge, SessionBadge::Connecting));
    }

    fn progress(&self, progress: Option<&str>) {
        let screen = &self.els.loading_screen;
        match progress {
            Some(text) => {
                self.els.loading_text.set_text_content(Some(text));
                dom::set_display(screen, "flex");
                dom::set_opacity(screen, "1");
            }
            None => {
                dom::set_opacity(screen, "0");
                let screen = screen.clone();
                Timeout::new(FADE_MS, move || {
                    // a later frame may have shown it again
                    if screen.style().get_property_value("opacity").as_deref() == Ok("0") {
                        dom::set_display(&screen, "none");
                    }
                })
                .forget();
            }
        }
    }

    fn filters(&self, instruction: &RenderInstruction) {
        self.els.category_filter.set_inner_html(&markup::category_options(
            &instruction.categories,
            &instruction.filter.category,
        ));
    }
}

impl Presenter for DomPresenter {
    fn render(&self, instruction: &RenderInstruction) {
        self.els
            .nft_grid
            .set_inner_html(&markup::grid(&instruction.catalog));
        self.els
            .featured_carousel
            .set_inner_html(&markup::carousel(&instruction.featured));
        self.filters(instruction);
        self.badge(&instruction.badge);
        self.progress(instruction.progress.as_deref());
        if let Some(notice) = &instruction.message {
            show_toast(notice);
        }
    }
}

pub fn show_toast(notice: &Notice) {
    let kind = match notice.kind {
        NoticeKind::Success => "success",
        NoticeKind::Error => "error",
        NoticeKind::Info => "info",
    };
    let toast = match dom::create_element("div") {
        Ok(el) => el,
        Err(err) => {
            gloo_console::error!("toast element not created", err);
            return;
        }
    };
    toast.set_class_name(&format!("toast toast-{kind}"));
    toast.set_text_content(Some(&notice.text));
    if let Some(body) = dom::document().body() {
        let _ = body.append_child(&toast);
    }

    Timeout::new(TOAST_MS, move || {
        if let Some(el) = toast.dyn_ref::<web_sys::HtmlElement>() {
            dom::set_opacity(el, "0");
        }
        Timeout::new(FADE_MS, move || toast.remove()).forget();
    })
    .forget();
}

//! Evasive Card entry point
//!
//! On the web: wires DOM events into a `Session` and applies its effects.
//! Natively: runs a short scripted session against a fixed layout.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_card {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        AddEventListenerOptions, Document, Element, EventTarget, HtmlElement, MouseEvent, PointerEvent, TouchEvent,
    };

    use evasive_card::audio::AudioManager;
    use evasive_card::celebration::{self, ConfettiPiece, SparkleFlight};
    use evasive_card::consts::*;
    use evasive_card::geometry::Rect;
    use evasive_card::session::{Effect, InputEvent, LayoutProvider, Session};
    use evasive_card::{Settings, Tuning};

    const HEADLINE_SUCCESS: &str = "Yaaay, Bejbi! 💖 Wiedziałem!";
    const YES_AGAIN_LABEL: &str = "Jeszcze raz!";
    const YES_AGAIN_ARIA: &str = "Odtwórz od nowa";
    const SOUND_ON_ICON: &str = "🔊";
    const SOUND_OFF_ICON: &str = "🔇";
    const SOUND_ON_ARIA: &str = "Wyłącz dźwięk";
    const SOUND_OFF_ARIA: &str = "Włącz dźwięk";

    /// Elements the card touches; cloning only copies JS handles
    #[derive(Clone)]
    struct Dom {
        document: Document,
        card: HtmlElement,
        yes: HtmlElement,
        no: HtmlElement,
        headline: Option<HtmlElement>,
        again: Option<HtmlElement>,
        success_area: Option<HtmlElement>,
        success_gif: Option<HtmlElement>,
        gif_fallback: Option<HtmlElement>,
        confetti: Option<HtmlElement>,
        tooltip: Option<HtmlElement>,
        particle_layer: Option<HtmlElement>,
        wizard: Option<Element>,
        sound_toggle: Option<HtmlElement>,
    }

    impl Dom {
        fn query(document: &Document) -> Option<Self> {
            let by_id = |id: &str| {
                document
                    .get_element_by_id(id)
                    .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            };
            let by_selector = |sel: &str| {
                document
                    .query_selector(sel)
                    .ok()
                    .flatten()
                    .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            };
            Some(Self {
                document: document.clone(),
                card: by_selector(".card")?,
                yes: by_id("btnYes")?,
                no: by_id("btnNo")?,
                headline: by_id("headline"),
                again: by_id("btnAgain"),
                success_area: by_id("successArea"),
                success_gif: by_id("successGif"),
                gif_fallback: by_id("gifFallback"),
                confetti: by_id("confettiContainer"),
                tooltip: by_id("easterTooltip"),
                particle_layer: by_selector(".particle-layer"),
                wizard: document.query_selector(".wizard-svg").ok().flatten(),
                sound_toggle: by_selector(".sound-toggle"),
            })
        }

        fn span(&self) -> Option<HtmlElement> {
            self.document
                .create_element("span")
                .ok()
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        }
    }

    fn to_rect(r: web_sys::DomRect) -> Rect {
        Rect::from_ltrb(r.left() as f32, r.top() as f32, r.right() as f32, r.bottom() as f32)
    }

    impl LayoutProvider for Dom {
        fn container(&self) -> Rect {
            to_rect(self.card.get_bounding_client_rect())
        }

        fn safe(&self) -> Rect {
            to_rect(self.yes.get_bounding_client_rect())
        }

        fn moving(&self) -> Rect {
            to_rect(self.no.get_bounding_client_rect())
        }
    }

    /// Card instance holding all state
    struct Card {
        session: Session,
        audio: AudioManager,
        dom: Dom,
        sparkle_timer: Option<i32>,
    }

    /// Feed one event to the session and apply what comes back
    fn dispatch(card: &Rc<RefCell<Card>>, event: InputEvent) {
        let effects = {
            let mut guard = card.borrow_mut();
            let c = &mut *guard;
            c.session.handle(event, &c.dom, js_sys::Date::now())
        };
        apply(card, effects);
    }

    fn apply(card: &Rc<RefCell<Card>>, effects: Vec<Effect>) {
        let dom = card.borrow().dom.clone();
        for effect in effects {
            match effect {
                Effect::MoveEvader { translate, animate } => move_evader(&dom.no, translate, animate),
                Effect::Play(cue) => card.borrow_mut().audio.play(cue),
                Effect::UnlockAudio => card.borrow_mut().audio.unlock(),
                Effect::StartMusic => card.borrow_mut().audio.start_music(),
                Effect::ResumeMusic => card.borrow_mut().audio.resume_music(),
                Effect::StopMusic => card.borrow_mut().audio.stop_music(),
                Effect::ShowTooltip => show_tooltip(&dom),
                Effect::HideTooltip => hide_tooltip(&dom),
                Effect::StopSparkles => stop_sparkles(card),
                Effect::SpawnSparkle(flight) => spawn_sparkle(&dom, flight),
                Effect::Celebrate => celebrate(&dom),
                Effect::Confetti(pieces) => spawn_confetti(&dom, &pieces),
                Effect::SoundToggled { enabled } => {
                    card.borrow_mut().audio.set_muted(!enabled);
                    if let Some(toggle) = &dom.sound_toggle {
                        toggle.set_text_content(Some(if enabled { SOUND_ON_ICON } else { SOUND_OFF_ICON }));
                        let _ = toggle.set_attribute("aria-label", if enabled { SOUND_ON_ARIA } else { SOUND_OFF_ARIA });
                    }
                }
                Effect::ShowImageFallback => {
                    if let Some(gif) = &dom.success_gif {
                        let _ = gif.style().set_property("display", "none");
                    }
                    if let Some(fallback) = &dom.gif_fallback {
                        fallback.set_hidden(false);
                    }
                }
                Effect::Reload => {
                    if let Some(window) = web_sys::window() {
                        let _ = window.location().reload();
                    }
                }
            }
        }
    }

    // === Timers ===

    fn set_timeout(ms: i32, f: impl FnOnce() + 'static) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut()>::once(f);
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(closure.as_ref().unchecked_ref(), ms);
        closure.forget();
    }

    fn request_animation_frame(f: impl FnOnce() + 'static) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(f64)>::once(move |_time: f64| f());
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn start_sparkles(card: &Rc<RefCell<Card>>) {
        {
            let c = card.borrow();
            if c.sparkle_timer.is_some() || !c.session.sparkles_enabled() {
                return;
            }
        }
        let Some(window) = web_sys::window() else { return };
        let tick_card = card.clone();
        let closure = Closure::<dyn FnMut()>::new(move || dispatch(&tick_card, InputEvent::SparkleTick));
        match window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            SPARKLE_INTERVAL_MS,
        ) {
            Ok(id) => card.borrow_mut().sparkle_timer = Some(id),
            Err(e) => log::warn!("Failed to start sparkles: {:?}", e),
        }
        closure.forget();
    }

    fn stop_sparkles(card: &Rc<RefCell<Card>>) {
        let timer = card.borrow_mut().sparkle_timer.take();
        if let (Some(id), Some(window)) = (timer, web_sys::window()) {
            window.clear_interval_with_handle(id);
        }
    }

    // === Presentation ===

    /// Shake in place, then snap to the new spot and re-arm the transition
    fn move_evader(no: &HtmlElement, translate: Vec2, animate: bool) {
        let transform = format!("translate({}px,{}px)", translate.x, translate.y);
        if !animate {
            let _ = no.style().set_property("transform", &transform);
            return;
        }
        let _ = no.class_list().add_1("shake");
        let no = no.clone();
        set_timeout(SHAKE_MS, move || {
            let _ = no.class_list().remove_1("shake");
            let style = no.style();
            let _ = style.set_property("transition", "none");
            let _ = style.set_property("transform", &transform);
            // Two frames so the jump commits before the transition returns
            request_animation_frame(move || {
                request_animation_frame(move || {
                    let _ = no.style().set_property("transition", MOVE_TRANSITION);
                })
            });
        });
    }

    fn show_tooltip(dom: &Dom) {
        let Some(tip) = dom.tooltip.clone() else { return };
        tip.set_hidden(false);
        let _ = tip.class_list().add_1("visible");
        set_timeout(TOOLTIP_FULL_MS, move || {
            let _ = tip.class_list().remove_1("visible");
            set_timeout(TOOLTIP_COMPACT_DELAY_MS, move || {
                let style = tip.style();
                let _ = style.set_property("font-size", "0.75rem");
                let _ = style.set_property("padding", "0.25rem 0.5rem");
                let _ = tip.class_list().add_1("visible");
            });
        });
    }

    fn hide_tooltip(dom: &Dom) {
        if let Some(tip) = &dom.tooltip {
            let _ = tip.class_list().remove_1("visible");
            tip.set_hidden(true);
        }
    }

    fn celebrate(dom: &Dom) {
        if let Some(headline) = &dom.headline {
            headline.set_inner_html(HEADLINE_SUCCESS);
        }
        let _ = dom.card.class_list().add_1("success");
        if let Some(area) = &dom.success_area {
            area.set_hidden(false);
        }
        let _ = dom.no.class_list().add_1("hidden");
        dom.yes.set_text_content(Some(YES_AGAIN_LABEL));
        let _ = dom.yes.set_attribute("aria-label", YES_AGAIN_ARIA);
    }

    fn spawn_confetti(dom: &Dom, pieces: &[ConfettiPiece]) {
        let Some(container) = &dom.confetti else { return };
        for piece in pieces {
            let Some(el) = dom.span() else { continue };
            el.set_text_content(Some(piece.symbol));
            let style = el.style();
            style.set_css_text(&piece.css_text());
            let _ = style.set_property("--twist", &format!("{}deg", piece.twist_deg));
            if container.append_child(&el).is_err() {
                continue;
            }
            set_timeout(CONFETTI_LIFETIME_MS, move || el.remove());
        }
    }

    fn spawn_sparkle(dom: &Dom, flight: SparkleFlight) {
        let (Some(layer), Some(wizard)) = (&dom.particle_layer, &dom.wizard) else {
            return;
        };
        if wizard.query_selector(".wand-tip").ok().flatten().is_none() {
            return;
        }
        let tip = celebration::wand_tip(
            &to_rect(wizard.get_bounding_client_rect()),
            &to_rect(layer.get_bounding_client_rect()),
        );
        let Some(p) = dom.span() else { return };
        p.set_class_name("sparkle");
        let style = p.style();
        style.set_css_text(&celebration::sparkle_css_text(tip));
        let _ = style.set_property("--dx", &format!("{}px", flight.dx));
        let _ = style.set_property("--dy", &format!("{}px", flight.dy));
        if layer.append_child(&p).is_ok() {
            set_timeout(SPARKLE_LIFETIME_MS, move || p.remove());
        }
    }

    fn inject_style(document: &Document, css: &str) {
        let Some(head) = document.query_selector("head").ok().flatten() else { return };
        if let Ok(style) = document.create_element("style") {
            style.set_text_content(Some(css));
            let _ = head.append_child(&style);
        }
    }

    // === Input ===

    fn listen<E: JsCast + 'static>(
        target: &EventTarget,
        kind: &str,
        options: Option<&AddEventListenerOptions>,
        mut handler: impl FnMut(E) + 'static,
    ) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
            if let Ok(event) = event.dyn_into::<E>() {
                handler(event);
            }
        });
        let callback = closure.as_ref().unchecked_ref();
        let result = match options {
            Some(opts) => target.add_event_listener_with_callback_and_add_event_listener_options(kind, callback, opts),
            None => target.add_event_listener_with_callback(kind, callback),
        };
        if result.is_err() {
            log::warn!("Failed to listen for {}", kind);
        }
        closure.forget();
    }

    fn client_pos(event: &MouseEvent) -> Vec2 {
        Vec2::new(event.client_x() as f32, event.client_y() as f32)
    }

    fn touch_positions(event: &TouchEvent) -> Vec<Vec2> {
        let touches = event.touches();
        (0..touches.length())
            .filter_map(|i| touches.get(i))
            .map(|t| Vec2::new(t.client_x() as f32, t.client_y() as f32))
            .collect()
    }

    /// Audio contexts only start inside a user gesture
    fn setup_audio_unlock(document: &Document, card: Rc<RefCell<Card>>) {
        let once = AddEventListenerOptions::new();
        once.set_once(true);
        once.set_capture(true);

        for (kind, prewarm) in [("pointerdown", true), ("touchstart", true), ("keydown", false)] {
            let card = card.clone();
            listen(document, kind, Some(&once), move |_event: web_sys::Event| {
                dispatch(&card, InputEvent::Unlock { prewarm });
            });
        }
    }

    fn setup_dodge_handlers(dom: &Dom, card: Rc<RefCell<Card>>) {
        // Mouse anywhere over the card; the session checks proximity
        {
            let card = card.clone();
            listen(&dom.card, "mousemove", None, move |event: MouseEvent| {
                dispatch(&card, InputEvent::MouseMove { pos: client_pos(&event) });
            });
        }

        for kind in ["mouseenter", "pointerenter"] {
            let card = card.clone();
            listen(&dom.no, kind, None, move |event: MouseEvent| {
                dispatch(&card, InputEvent::PointerEnter { pos: client_pos(&event) });
            });
        }

        // Touch on the button itself; block the synthetic click
        {
            let card = card.clone();
            let opts = AddEventListenerOptions::new();
            opts.set_passive(false);
            listen(&dom.no, "touchstart", Some(&opts), move |event: TouchEvent| {
                event.prevent_default();
                if let Some(pos) = touch_positions(&event).first() {
                    dispatch(&card, InputEvent::TouchStart { pos: *pos });
                }
            });
        }

        {
            let card = card.clone();
            listen(&dom.no, "pointerdown", None, move |event: PointerEvent| {
                if event.pointer_type() == "touch" {
                    dispatch(&card, InputEvent::TouchStart { pos: client_pos(&event) });
                }
            });
        }

        // Finger sliding toward the button from anywhere on the page
        {
            let opts = AddEventListenerOptions::new();
            opts.set_passive(true);
            listen(&dom.document, "touchmove", Some(&opts), move |event: TouchEvent| {
                dispatch(&card, InputEvent::TouchMove { touches: touch_positions(&event) });
            });
        }
    }

    fn setup_buttons(dom: &Dom, card: Rc<RefCell<Card>>) {
        {
            let card = card.clone();
            listen(&dom.yes, "click", None, move |_event: MouseEvent| {
                dispatch(&card, InputEvent::Confirm);
            });
        }

        if let Some(again) = &dom.again {
            let card = card.clone();
            listen(again, "click", None, move |_event: MouseEvent| {
                dispatch(&card, InputEvent::Again);
            });
        }

        if let Some(toggle) = &dom.sound_toggle {
            let card = card.clone();
            listen(toggle, "click", None, move |_event: MouseEvent| {
                dispatch(&card, InputEvent::ToggleSound);
            });
        }

        if let Some(gif) = &dom.success_gif {
            listen(gif, "error", None, move |_event: web_sys::Event| {
                dispatch(&card, InputEvent::ImageError);
            });
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Evasive card starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document");
            return;
        };
        let Some(dom) = Dom::query(&document) else {
            log::error!("Card markup missing (.card, #btnYes, #btnNo)");
            return;
        };

        inject_style(&document, celebration::SPARKLE_KEYFRAMES);
        inject_style(&document, celebration::CONFETTI_KEYFRAMES);

        let mut settings = Settings::from_environment();
        settings.apply_strategy(dom.card.get_attribute("data-strategy").as_deref());
        let tuning = Tuning::from_json_or_default(dom.card.get_attribute("data-tuning").as_deref());

        let seed = js_sys::Date::now() as u64;
        let session = Session::new(settings, &tuning, seed);
        let prefs = session.settings();
        let audio = AudioManager::new(prefs.master_volume, !prefs.sound_enabled);
        log::info!("Card initialized with seed {} ({} solver)", seed, session.strategy().as_str());

        let card = Rc::new(RefCell::new(Card {
            session,
            audio,
            dom: dom.clone(),
            sparkle_timer: None,
        }));

        setup_audio_unlock(&document, card.clone());
        setup_dodge_handlers(&dom, card.clone());
        setup_buttons(&dom, card.clone());

        set_timeout(SPARKLE_START_DELAY_MS, move || start_sparkles(&card));

        log::info!("Evasive card running!");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_card::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Evasive card (native) starting...");
    log::info!("The card itself runs in the browser - build for wasm32 and serve with `trunk serve`");

    run_headless();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Chase the button with a pointer parked in the top-right corner, then confirm
#[cfg(not(target_arch = "wasm32"))]
fn run_headless() {
    use evasive_card::session::{Effect, InputEvent, Session, StaticLayout};
    use evasive_card::{Rect, Settings, Tuning};
    use glam::Vec2;

    let mut layout = StaticLayout {
        container: Rect::from_ltrb(0.0, 0.0, 400.0, 300.0),
        safe: Rect::from_ltrb(150.0, 130.0, 250.0, 170.0),
        moving: Rect::from_ltwh(270.0, 130.0, 100.0, 40.0),
    };
    let origin = layout.moving.top_left();
    let pointer = Vec2::new(350.0, 20.0);
    let mut session = Session::new(Settings::default(), &Tuning::default(), 0x5eed);

    for i in 0..6 {
        let now = i as f64 * 250.0;
        for effect in session.handle(InputEvent::PointerEnter { pos: pointer }, &layout, now) {
            match effect {
                Effect::MoveEvader { translate, .. } => {
                    layout.moving = layout.moving.moved_to(origin + translate);
                    println!("dodge {}: button at {}", i + 1, layout.moving.top_left());
                }
                other => println!("dodge {}: {:?}", i + 1, other),
            }
        }
    }

    let effects = session.handle(InputEvent::Confirm, &layout, 2000.0);
    println!(
        "confirmed: {} effects, dodging {}",
        effects.len(),
        if session.is_confirmed() { "off" } else { "on" }
    );
}

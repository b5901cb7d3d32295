//! Fruit Slash entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::mpsc::Receiver;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{HtmlVideoElement, MediaStream, MediaStreamConstraints, MediaTrackConstraints};

    use fruit_slash::consts;
    use fruit_slash::sim::{GameEvent, GamePhase};
    use fruit_slash::tracking::{HandDetection, HandSource, LANDMARK_COUNT, SourceError};
    use fruit_slash::{Session, Viewport};

    // The MediaPipe hand landmarker and the canvas renderer live on the JS
    // side; everything that crosses back is a flat array or a JSON snapshot
    #[wasm_bindgen(inline_js = "
        export async function create_hand_landmarker() {
            const vision = await import(
                'https://cdn.jsdelivr.net/npm/@mediapipe/tasks-vision@0.10.9'
            );
            const fileset = await vision.FilesetResolver.forVisionTasks(
                'https://cdn.jsdelivr.net/npm/@mediapipe/tasks-vision@0.10.9/wasm'
            );
            return await vision.HandLandmarker.createFromOptions(fileset, {
                baseOptions: {
                    modelAssetPath:
                        'https://storage.googleapis.com/mediapipe-models/hand_landmarker/hand_landmarker/float16/1/hand_landmarker.task',
                    delegate: 'GPU',
                },
                runningMode: 'VIDEO',
                numHands: 2,
                minHandDetectionConfidence: 0.1,
                minHandPresenceConfidence: 0.1,
                minTrackingConfidence: 0.1,
            });
        }

        export function detect_hands(landmarker, video, timestampMs) {
            const result = landmarker.detectForVideo(video, timestampMs);
            const flat = [];
            for (const hand of result.landmarks) {
                for (const point of hand) {
                    flat.push(point.x, point.y);
                }
            }
            return new Float32Array(flat);
        }

        export function close_hand_landmarker(landmarker) {
            landmarker.close();
        }

        export function render_frame(json) {
            if (window.fruitSlashRender) {
                window.fruitSlashRender(JSON.parse(json));
            }
        }
    ")]
    extern "C" {
        #[wasm_bindgen(catch)]
        async fn create_hand_landmarker() -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        fn detect_hands(
            landmarker: &JsValue,
            video: &HtmlVideoElement,
            timestamp_ms: f64,
        ) -> Result<Vec<f32>, JsValue>;

        fn close_hand_landmarker(landmarker: &JsValue);

        fn render_frame(json: &str);
    }

    /// Camera-fed MediaPipe detector behind the `HandSource` seam
    struct WebHandSource {
        landmarker: JsValue,
        video: HtmlVideoElement,
    }

    impl HandSource for WebHandSource {
        fn detect(&mut self, timestamp_ms: f64) -> Result<Vec<HandDetection>, SourceError> {
            // HAVE_CURRENT_DATA; earlier states have no frame to read
            if self.video.ready_state() < 2 {
                return Ok(Vec::new());
            }
            let flat = detect_hands(&self.landmarker, &self.video, timestamp_ms)
                .map_err(|err| SourceError::new(format!("{err:?}")))?;

            let per_hand = LANDMARK_COUNT * 2;
            let mut hands = Vec::with_capacity(flat.len() / per_hand);
            for chunk in flat.chunks_exact(per_hand) {
                let landmarks = chunk
                    .chunks_exact(2)
                    .map(|xy| Vec2::new(xy[0], xy[1]))
                    .collect();
                hands.push(HandDetection::new(landmarks));
            }
            Ok(hands)
        }
    }

    /// Shell instance holding the session and browser-side resources
    struct Shell {
        session: Session,
        events: Receiver<GameEvent>,
        source: Option<WebHandSource>,
        stream: Option<MediaStream>,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        torn_down: bool,
    }

    impl Shell {
        fn new(seed: u64) -> Self {
            let mut session = Session::new(seed);
            let events = session.subscribe();
            Self {
                session,
                events,
                source: None,
                stream: None,
                last_time: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
                torn_down: false,
            }
        }

        /// Match the simulation viewport to the window
        fn sync_viewport(&mut self) {
            let window = match web_sys::window() {
                Some(w) => w,
                None => return,
            };
            let width = window
                .inner_width()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(consts::DEFAULT_VIEW_WIDTH as f64);
            let height = window
                .inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(consts::DEFAULT_VIEW_HEIGHT as f64);
            self.session
                .set_viewport(Viewport::new(width as f32, height as f32));
        }

        /// One animation frame: poll the detector, advance the session
        fn frame(&mut self, time: f64) {
            let delta = if self.last_time > 0.0 {
                (((time - self.last_time) / consts::FRAME_MS) as f32)
                    .min(consts::MAX_DELTA_FRAMES)
            } else {
                1.0
            };
            self.last_time = time;

            if let Some(source) = self.source.as_mut() {
                self.session.poll_source(source, time);
            }
            self.session.update(delta);

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Hand the frame snapshot to the JS canvas renderer
        fn render(&self) {
            match serde_json::to_string(&self.session.frame_view()) {
                Ok(json) => render_frame(&json),
                Err(err) => log::warn!("render snapshot failed: {err}"),
            }
        }

        /// Push session events into the DOM HUD
        fn drain_events(&self) {
            let document = match web_sys::window().and_then(|w| w.document()) {
                Some(d) => d,
                None => return,
            };
            for event in self.events.try_iter() {
                match event {
                    GameEvent::ScoreChanged { score } => {
                        set_hud_value(&document, "#hud-score .hud-value", &score.to_string());
                    }
                    GameEvent::LivesChanged { lives } => {
                        set_hud_value(&document, "#hud-lives .hud-value", &lives.to_string());
                    }
                    GameEvent::ComboChanged { combo } => {
                        if let Some(el) = document.get_element_by_id("hud-combo") {
                            if combo > 1 {
                                set_hud_value(
                                    &document,
                                    "#hud-combo .hud-value",
                                    &format!("x{combo}"),
                                );
                                // Re-set the class to retrigger the pop animation
                                let _ = el.set_attribute("class", "hud-item pop");
                            } else {
                                let _ = el.set_attribute("class", "hud-item hidden");
                            }
                        }
                    }
                    GameEvent::CountdownTick { seconds_left } => {
                        if let Some(el) = document.get_element_by_id("countdown") {
                            el.set_text_content(Some(&seconds_left.to_string()));
                        }
                    }
                    GameEvent::CountdownGo => {
                        if let Some(el) = document.get_element_by_id("countdown") {
                            el.set_text_content(Some("GO!"));
                        }
                    }
                    GameEvent::BombContact => {}
                    GameEvent::GameOver { score, best_combo } => {
                        if let Some(el) = document.get_element_by_id("final-score") {
                            el.set_text_content(Some(&score.to_string()));
                        }
                        if let Some(el) = document.get_element_by_id("final-combo") {
                            el.set_text_content(Some(&format!("x{best_combo}")));
                        }
                    }
                }
            }
        }

        /// Phase-driven overlay visibility and the FPS readout
        fn update_hud(&self) {
            let document = match web_sys::window().and_then(|w| w.document()) {
                Some(d) => d,
                None => return,
            };
            let phase = self.session.phase();
            set_visible(&document, "menu", phase == GamePhase::Menu);
            set_visible(&document, "loading", phase == GamePhase::Loading);
            set_visible(&document, "countdown", phase == GamePhase::Countdown);
            set_visible(&document, "game-over", phase == GamePhase::GameOver);
            set_visible(&document, "hud", phase != GamePhase::Menu && phase != GamePhase::Loading);

            if self.session.settings().show_fps {
                set_hud_value(&document, "#hud-fps .hud-value", &self.fps.to_string());
            }
        }
    }

    fn set_hud_value(document: &web_sys::Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &web_sys::Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    /// Open the user-facing camera and pipe it into the video element
    async fn open_camera(video: &HtmlVideoElement) -> Result<MediaStream, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let devices = window.navigator().media_devices()?;

        let video_constraints = MediaTrackConstraints::new();
        video_constraints.set_facing_mode(&JsValue::from_str("user"));
        let constraints = MediaStreamConstraints::new();
        constraints.set_video(&video_constraints);

        let stream: MediaStream =
            JsFuture::from(devices.get_user_media_with_constraints(&constraints)?)
                .await?
                .dyn_into()?;
        video.set_src_object(Some(&stream));
        JsFuture::from(video.play()?).await?;
        Ok(stream)
    }

    async fn init_tracking() -> Result<(WebHandSource, MediaStream), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let video: HtmlVideoElement = document
            .get_element_by_id("camera")
            .ok_or_else(|| JsValue::from_str("no #camera element"))?
            .dyn_into()?;

        let stream = open_camera(&video).await?;
        log::info!("camera opened");

        let landmarker = create_hand_landmarker().await?;
        log::info!("hand landmarker ready");

        Ok((WebHandSource { landmarker, video }, stream))
    }

    /// End the run if the camera track dies mid-game
    fn watch_track_end(shell: Rc<RefCell<Shell>>, stream: &MediaStream) {
        let tracks = stream.get_video_tracks();
        if let Ok(track) = tracks.get(0).dyn_into::<web_sys::MediaStreamTrack>() {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                shell.borrow_mut().session.fail_stop("camera track ended");
            });
            track.set_onended(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Fruit Slash starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let seed = js_sys::Date::now() as u64;
        let shell = Rc::new(RefCell::new(Shell::new(seed)));
        shell.borrow_mut().sync_viewport();

        log::info!("Session created with seed: {}", seed);

        setup_start_button(shell.clone());
        setup_restart_button(shell.clone());
        setup_mirror_toggle(shell.clone());
        setup_resize(shell.clone());
        setup_teardown(shell.clone());

        // The menu stays up until the player opts in to the camera
        if let Some(el) = document.get_element_by_id("loading") {
            let _ = el.set_attribute("class", "hidden");
        }

        request_animation_frame(shell);

        log::info!("Fruit Slash running!");
    }

    fn setup_start_button(shell: Rc<RefCell<Shell>>) {
        let document = web_sys::window().unwrap().document().unwrap();
        if let Some(btn) = document.get_element_by_id("start-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                shell.borrow_mut().session.begin_loading();

                let task_shell = shell.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match init_tracking().await {
                        Ok((source, stream)) => {
                            watch_track_end(task_shell.clone(), &stream);
                            let mut s = task_shell.borrow_mut();
                            s.source = Some(source);
                            s.stream = Some(stream);
                            s.session.begin_countdown();
                        }
                        Err(err) => {
                            log::error!("camera/tracker init failed: {err:?}");
                            let document = web_sys::window().unwrap().document().unwrap();
                            if let Some(el) = document.get_element_by_id("menu-error") {
                                el.set_text_content(Some(
                                    "Camera unavailable. Check permissions and retry.",
                                ));
                                let _ = el.set_attribute("class", "");
                            }
                            task_shell
                                .borrow_mut()
                                .session
                                .abort_loading("tracker init failed");
                        }
                    }
                });
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_restart_button(shell: Rc<RefCell<Shell>>) {
        let document = web_sys::window().unwrap().document().unwrap();
        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                shell.borrow_mut().session.restart(seed);
                log::info!("Restarted with seed: {}", seed);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_mirror_toggle(shell: Rc<RefCell<Shell>>) {
        let document = web_sys::window().unwrap().document().unwrap();
        if let Some(btn) = document.get_element_by_id("mirror-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut s = shell.borrow_mut();
                let mut settings = s.session.settings().clone();
                settings.mirror_input = !settings.mirror_input;
                settings.save();
                s.session.apply_settings(settings);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(shell: Rc<RefCell<Shell>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            shell.borrow_mut().sync_viewport();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_teardown(shell: Rc<RefCell<Shell>>) {
        let window = web_sys::window().unwrap();
        for event_name in ["pagehide", "beforeunload"] {
            let shell = shell.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                teardown(&shell);
            });
            let _ = window
                .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Release the camera and the landmarker exactly once
    fn teardown(shell: &Rc<RefCell<Shell>>) {
        let mut s = shell.borrow_mut();
        if s.torn_down {
            return;
        }
        s.torn_down = true;

        if let Some(stream) = s.stream.take() {
            for track in stream.get_tracks().iter() {
                if let Ok(track) = track.dyn_into::<web_sys::MediaStreamTrack>() {
                    track.stop();
                }
            }
        }
        if let Some(source) = s.source.take() {
            close_hand_landmarker(&source.landmarker);
        }
        s.session.shutdown();
        log::info!("torn down");
    }

    fn request_animation_frame(shell: Rc<RefCell<Shell>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            frame_loop(shell, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(shell: Rc<RefCell<Shell>>, time: f64) {
        {
            let s = shell.borrow();
            if s.torn_down {
                return;
            }
        }
        {
            let mut s = shell.borrow_mut();
            s.frame(time);
            s.drain_events();
            s.render();
            s.update_hud();
        }
        request_animation_frame(shell);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use fruit_slash::sim::GameEvent;
    use fruit_slash::tracking::ScriptedSource;
    use fruit_slash::{Session, Settings, Tuning, consts};

    env_logger::init();
    log::info!("Fruit Slash (native demo) starting...");

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0xF00D);

    let tuning = match std::env::var("FRUIT_SLASH_TUNING") {
        Ok(json) => match Tuning::from_json(&json) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::warn!("Bad FRUIT_SLASH_TUNING, using defaults: {err}");
                Tuning::default()
            }
        },
        Err(_) => Tuning::default(),
    };

    let mut session = Session::with_config(seed, tuning, Settings::load());
    let events = session.subscribe();
    let mut source = ScriptedSource::new();

    log::info!("Session created with seed: {}", seed);
    session.begin_countdown();

    // 45 seconds of scripted play at a simulated 60 Hz
    let total_frames = 60 * 45;
    for frame in 0..total_frames {
        let timestamp_ms = frame as f64 * consts::FRAME_MS;
        session.poll_source(&mut source, timestamp_ms);
        session.update(1.0);

        let mut over = false;
        for event in events.try_iter() {
            match event {
                GameEvent::ScoreChanged { score } => log::info!("score {score}"),
                GameEvent::ComboChanged { combo } if combo > 1 => log::info!("combo x{combo}"),
                GameEvent::LivesChanged { lives } => log::info!("lives {lives}"),
                GameEvent::CountdownTick { seconds_left } => {
                    log::info!("starting in {seconds_left}")
                }
                GameEvent::CountdownGo => log::info!("go!"),
                GameEvent::BombContact => log::warn!("bomb!"),
                GameEvent::GameOver { score, best_combo } => {
                    println!("game over: {score} points, best combo x{best_combo}");
                    over = true;
                }
                _ => {}
            }
        }
        if over {
            break;
        }
    }

    session.shutdown();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

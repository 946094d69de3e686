use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{error, info};
use url::Url;

use blinkseq::error::LinkError;
use blinkseq::transport::{self, blink_url, sms_link, verification_url, EmailForm};
use blinkseq::{
    is_mobile, Config, Identifier, LaunchParams, PlaybackEngine, PlaybackEvent, PresentationMode,
};

#[derive(Parser, Debug)]
#[command(name = "blinkseq", about = "Blink a session key as a looping color signal")]
struct Args {
    /// 5-digit hex session key
    #[arg(short, long)]
    key: Option<String>,

    /// Milliseconds per symbol
    #[arg(short, long)]
    rate: Option<String>,

    /// Launch URL; its `key` and `rate` query parameters win over the flags
    #[arg(long)]
    url: Option<String>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log symbols instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Stop after this many symbols (headless only)
    #[arg(long)]
    max_ticks: Option<u64>,

    #[arg(long, default_value = "")]
    user_agent: String,

    #[arg(long, default_value_t = 0)]
    touch_points: u32,
}

/// Everything resolved from flags, config and launch URL.
struct Launch {
    config: Config,
    key: Option<String>,
    rate: Duration,
    mode: PresentationMode,
}

impl Launch {
    fn resolve(args: &Args) -> blinkseq::Result<Self> {
        let config = match &args.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        let params = match &args.url {
            Some(raw) => {
                let url = Url::parse(raw).map_err(|source| LinkError::BaseUrl {
                    base: raw.clone(),
                    source,
                })?;
                LaunchParams::from_url(&url)?
            }
            None => LaunchParams::default(),
        };

        let rate = match (params.rate, &args.rate) {
            (Some(rate), _) => rate,
            (None, Some(raw)) => transport::parse_rate(Some(raw.as_str()))?,
            (None, None) => config.rate(),
        };
        let key = transport::resolve_key(params.key.as_deref(), args.key.as_deref());

        let mobile = is_mobile(&args.user_agent, args.touch_points);
        info!("Is mobile device? {}", mobile);

        Ok(Self {
            config,
            key,
            rate,
            mode: PresentationMode::choose(mobile),
        })
    }
}

/// Links a desktop user can hand over to a phone.
fn share_links(config: &Config, key: &Identifier, rate: Duration) -> blinkseq::Result<Vec<String>> {
    let blink = blink_url(&config.base_url, key, rate)?;
    let verify = verification_url(&config.verify_url, key, rate)?;
    let sms = sms_link("", &config.sms_body, &verify);
    Ok(vec![blink.to_string(), verify.to_string(), sms])
}

/// True while fewer than `max_ticks` symbols have been emitted.
fn within_budget(max_ticks: Option<u64>, emitted: u64) -> bool {
    max_ticks.map_or(true, |max| emitted < max)
}

fn run_headless(launch: Launch, max_ticks: Option<u64>) -> blinkseq::Result<()> {
    let key = Identifier::parse(launch.key.as_deref().unwrap_or(""))?;
    let frame = key.to_frame()?;

    for link in share_links(&launch.config, &key, launch.rate)? {
        info!("link: {}", link);
    }
    info!(
        "email form: {}",
        EmailForm::new(key.clone(), launch.rate).to_urlencoded()
    );
    info!("blinking {} as {} every {:?}", key, frame, launch.rate);
    if !within_budget(max_ticks, 0) {
        info!("tick limit is zero, nothing to emit");
        return Ok(());
    }

    let mut engine = PlaybackEngine::new();
    engine.start(frame, launch.rate, |_| {})?;

    let mut emitted = 0u64;
    engine.run(|event| {
        match event {
            PlaybackEvent::SymbolEmitted { index, symbol } => {
                info!("{:>2} {:<10} {}", index, format!("{:?}", symbol), symbol.color());
                emitted += 1;
            }
            PlaybackEvent::FrameCompleted { frames } => info!("frame {} complete", frames),
            PlaybackEvent::Stopped => {}
        }

        if within_budget(max_ticks, emitted) {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    });
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let result = Launch::resolve(&args).and_then(|launch| {
        if args.headless {
            run_headless(launch, args.max_ticks)
        } else {
            gui::run(launch)
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "gui"))]
mod gui {
    use super::Launch;

    pub fn run(_launch: Launch) -> blinkseq::Result<()> {
        eprintln!("This binary requires the 'gui' feature to be enabled; use --headless");
        std::process::exit(1);
    }
}

#[cfg(feature = "gui")]
mod gui {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    use eframe::egui;
    use log::{error, warn};

    use super::{share_links, Launch};
    use blinkseq::transport::{blink_url, resolve_key, ScanCode};
    use blinkseq::{Config, Identifier, PlaybackEngine, PresentationMode, Symbol};

    const RATE_CHOICES: [u64; 6] = [100, 150, 200, 250, 300, 500];

    /// Side of one code module in points; the quiet zone is four modules.
    const MODULE_SIZE: f32 = 6.0;

    fn scan_code(config: &Config, key: &Identifier, rate: Duration) -> Option<ScanCode> {
        let code = blink_url(&config.base_url, key, rate)
            .map_err(blinkseq::Error::from)
            .and_then(|url| Ok(ScanCode::for_url(&url)?));
        match code {
            Ok(code) => Some(code),
            Err(err) => {
                warn!("no scan code for {}: {}", key, err);
                None
            }
        }
    }

    /// Paints the code on a white square. Returns true when it is clicked.
    fn show_scan_code(ui: &mut egui::Ui, code: &ScanCode) -> bool {
        let quiet = 4.0 * MODULE_SIZE;
        let side = code.width() as f32 * MODULE_SIZE + 2.0 * quiet;
        let (rect, response) =
            ui.allocate_exact_size(egui::vec2(side, side), egui::Sense::click());

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, egui::Color32::WHITE);
        let module = egui::vec2(MODULE_SIZE, MODULE_SIZE);
        for (x, y) in code.dark_modules() {
            let min = rect.min + egui::vec2(quiet + x as f32 * MODULE_SIZE, quiet + y as f32 * MODULE_SIZE);
            painter.rect_filled(egui::Rect::from_min_size(min, module), 0.0, egui::Color32::BLACK);
        }

        response.on_hover_cursor(egui::CursorIcon::PointingHand).clicked()
    }

    pub fn run(launch: Launch) -> blinkseq::Result<()> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([800.0, 800.0])
                .with_fullscreen(launch.config.fullscreen)
                .with_title("BLINKSEQ - Session Key Blinker"),
            ..Default::default()
        };

        let app = BlinkApp::new(launch);
        if let Err(err) = eframe::run_native(
            "BLINKSEQ",
            options,
            Box::new(|_cc| Ok(Box::new(app))),
        ) {
            error!("window closed with error: {}", err);
        }
        Ok(())
    }

    enum UiAction {
        Start,
        Stop,
        ShowHere,
        DismissNotice,
    }

    struct BlinkApp {
        engine: PlaybackEngine,
        config: Config,
        mode: PresentationMode,
        current: Rc<Cell<Option<Symbol>>>,

        // UI state
        url_key: Option<String>,
        key_input: String,
        rate_ms: u64,
        links: Vec<String>,
        scan_code: Option<ScanCode>,
        notice: Option<String>,
    }

    impl BlinkApp {
        fn new(launch: Launch) -> Self {
            let launch_key = launch.key.as_deref().and_then(|k| Identifier::parse(k).ok());
            let links = launch_key
                .as_ref()
                .and_then(|id| share_links(&launch.config, id, launch.rate).ok())
                .unwrap_or_default();
            let code = launch_key
                .as_ref()
                .and_then(|id| scan_code(&launch.config, id, launch.rate));

            let mut app = Self {
                engine: PlaybackEngine::new(),
                config: launch.config,
                mode: launch.mode,
                current: Rc::new(Cell::new(None)),
                url_key: launch.key,
                key_input: String::new(),
                rate_ms: u64::try_from(launch.rate.as_millis()).unwrap_or(u64::MAX),
                links,
                scan_code: code,
                notice: None,
            };

            if app.mode == PresentationMode::DirectPlayback && app.url_key.is_some() {
                app.start_blinking();
            }
            app
        }

        fn start_blinking(&mut self) {
            let key = resolve_key(self.url_key.as_deref(), Some(self.key_input.as_str()));
            let Some(key) = key else {
                self.notice = Some("No session key found".to_string());
                return;
            };

            let rate = Duration::from_millis(self.rate_ms);
            let current = Rc::clone(&self.current);
            let started = Identifier::parse(&key)
                .map_err(blinkseq::Error::from)
                .and_then(|id| {
                    let frame = id.to_frame()?;
                    self.links = share_links(&self.config, &id, rate)?;
                    self.scan_code = scan_code(&self.config, &id, rate);
                    self.engine
                        .start(frame, rate, move |symbol| current.set(Some(symbol)))?;
                    Ok(())
                });

            if let Err(err) = started {
                warn!("could not start blinking: {}", err);
                self.notice = Some(err.to_string());
            }
        }

        fn stop_blinking(&mut self) {
            self.engine.stop();
            self.current.set(None);
        }

        fn show_idle(&mut self, ui: &mut egui::Ui) -> Option<UiAction> {
            let mut action = None;

            ui.heading("BLINKSEQ - Session Key Blinker");
            ui.add_space(10.0);

            if self.mode == PresentationMode::ScannableCode && !self.links.is_empty() {
                if let Some(code) = &self.scan_code {
                    ui.label("Scan with your phone, or click the code to blink here:");
                    if show_scan_code(ui, code) {
                        action = Some(UiAction::ShowHere);
                    }
                    ui.add_space(10.0);
                }
                ui.label("Or open this link on your phone:");
                for link in &self.links {
                    ui.horizontal(|ui| {
                        ui.monospace(link);
                        if ui.button("Copy").clicked() {
                            ui.ctx().copy_text(link.clone());
                        }
                    });
                }
                ui.add_space(10.0);
                if ui.button("Blink on this screen anyway").clicked() {
                    action = Some(UiAction::ShowHere);
                }
                return action;
            }

            ui.horizontal(|ui| {
                ui.label("Session key:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.key_input)
                        .hint_text("5-digit hex")
                        .char_limit(5),
                );
            });

            ui.horizontal(|ui| {
                ui.label("Rate:");
                egui::ComboBox::from_id_source("rate")
                    .selected_text(format!("{} ms", self.rate_ms))
                    .show_ui(ui, |ui| {
                        for choice in RATE_CHOICES {
                            ui.selectable_value(&mut self.rate_ms, choice, format!("{} ms", choice));
                        }
                    });
            });

            ui.add_space(10.0);
            if ui.button("▶ Start").clicked() {
                action = Some(UiAction::Start);
            }
            action
        }
    }

    impl eframe::App for BlinkApp {
        fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
            self.engine.poll();
            self.engine.poll_events();

            let mut action = None;

            if self.engine.is_running() {
                let color = self
                    .current
                    .get()
                    .unwrap_or(Symbol::Delimiter)
                    .color();
                let fill = egui::Color32::from_rgb(color.r, color.g, color.b);

                egui::CentralPanel::default()
                    .frame(egui::Frame::none().fill(fill))
                    .show(ctx, |ui| {
                        if ui.button("⏸ Stop").clicked() {
                            action = Some(UiAction::Stop);
                        }
                    });

                let wait = self
                    .engine
                    .sequencer()
                    .next_tick_in()
                    .unwrap_or(Duration::ZERO);
                ctx.request_repaint_after(wait);
            } else {
                egui::CentralPanel::default()
                    .frame(egui::Frame::none().fill(egui::Color32::BLACK).inner_margin(16.0))
                    .show(ctx, |ui| {
                        action = self.show_idle(ui);
                    });
            }

            if let Some(notice) = &self.notice {
                egui::Window::new("Notice")
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                    .show(ctx, |ui| {
                        ui.label(notice);
                        if ui.button("OK").clicked() {
                            action = Some(UiAction::DismissNotice);
                        }
                    });
            }

            match action {
                Some(UiAction::Start) => self.start_blinking(),
                Some(UiAction::Stop) => self.stop_blinking(),
                Some(UiAction::ShowHere) => {
                    self.mode = PresentationMode::DirectPlayback;
                    if self.url_key.is_some() {
                        self.start_blinking();
                    }
                }
                Some(UiAction::DismissNotice) => self.notice = None,
                None => {}
            }
        }
    }
}

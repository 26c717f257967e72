use color_eyre::Result;
use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use std::path::PathBuf;
use std::sync::{mpsc::Sender, Arc};

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use ratatui::widgets::{Block, Borders, Paragraph};

pub mod backend;
pub mod cache;
pub mod chart_export;
pub mod chart_lifecycle;
pub mod config;
pub mod form;
pub mod histogram;
pub mod interaction;
pub mod logging;
pub mod request;
pub mod residues;
pub mod series;
pub mod viewport;
pub mod widgets;

pub use backend::{Backend, BackendRequest, BackendResponse, HttpBackend, Payload, PointValue};
pub use cache::CacheManager;
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme,
};
pub use lscan_cli::{Args, ExportFormat, ViewMode};

use chart_lifecycle::{ChartLifecycleManager, Surface};
use form::{FieldValues, Focus, ParameterPanel};
use histogram::Histogram;
use interaction::Action;
use request::{Completion, RequestOrchestrator, Resolution};
use residues::CharacterSelector;
use series::ScanContext;
use viewport::Viewport;
use widgets::chart::{render_chart, ChartView};
use widgets::controls::Controls;
use widgets::debug::DebugState;
use widgets::info::InfoPanel;
use widgets::params::ParamsView;

/// Application name used for cache directory and other app-specific paths
pub const APP_NAME: &str = "lscan";

const PARAMS_WIDTH: u16 = 36;
const INFO_HEIGHT: u16 = 10;

pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// Fetch data for the current parameters and view
    Refresh,
    Fetched(Completion),
    Exit,
    Crash(String),
}

/// Starting parameters, from the config file with command-line overrides
/// applied on top.
#[derive(Debug, Clone, PartialEq)]
pub struct AppOptions {
    pub modulus: u64,
    pub character: usize,
    pub start: f64,
    pub end: f64,
    pub real_part: f64,
    pub view: ViewMode,
    pub end_step: f64,
    pub clt_start: f64,
    pub clt_end: f64,
    pub samples: usize,
    pub max_x_ticks: usize,
    pub grid_columns: usize,
    pub show_info: bool,
    pub export_dir: Option<PathBuf>,
    pub export_format: ExportFormat,
    pub export_size: (u32, u32),
    pub debug: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl AppOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            modulus: config.scan.modulus,
            character: config.scan.character,
            start: config.scan.start,
            end: config.scan.end,
            real_part: config.scan.real_part,
            view: config.view(),
            end_step: config.scan.end_step,
            clt_start: config.clt.start,
            clt_end: config.clt.end,
            samples: config.clt.samples,
            max_x_ticks: config.display.max_x_ticks,
            grid_columns: config.display.grid_columns,
            show_info: config.display.show_info,
            export_dir: config.export.directory.clone(),
            export_format: config.export_format(),
            export_size: (config.export.width, config.export.height),
            debug: config.debug.enabled,
        }
    }

    /// Command-line values win over whatever the config said.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(q) = args.modulus {
            self.modulus = q;
        }
        if let Some(c) = args.character {
            self.character = c;
        }
        if let Some(start) = args.start {
            self.start = start;
        }
        if let Some(end) = args.end {
            self.end = end;
        }
        if let Some(r) = args.real_part {
            self.real_part = r;
        }
        if let Some(view) = args.view {
            self.view = view;
        }
        if let Some(start) = args.clt_start {
            self.clt_start = start;
        }
        if let Some(end) = args.clt_end {
            self.clt_end = end;
        }
        if let Some(samples) = args.samples {
            self.samples = samples;
        }
        if let Some(format) = args.export_format {
            self.export_format = format;
        }
        if args.debug {
            self.debug = true;
        }
    }
}

pub struct App {
    backend: Arc<dyn Backend>,
    events: Sender<AppEvent>,
    theme: Theme,
    options: AppOptions,
    selector: CharacterSelector,
    viewport: Viewport,
    view: ViewMode,
    real_part: f64,
    clt_start: f64,
    clt_end: f64,
    samples: usize,
    scans: RequestOrchestrator,
    points: RequestOrchestrator,
    charts: ChartLifecycleManager,
    panel: ParameterPanel,
    point: Option<PointValue>,
    histogram_summary: Option<String>,
    status: Option<String>,
    last_error: Option<String>,
    hover: Option<(Surface, f64)>,
    info_visible: bool,
    debug: DebugState,
}

impl App {
    pub fn new(
        events: Sender<AppEvent>,
        backend: Arc<dyn Backend>,
        theme: Theme,
        options: AppOptions,
    ) -> Self {
        let mut selector = CharacterSelector::new(options.modulus);
        if !selector.select(options.character) {
            log::warn!(
                "character {} not available mod {}, using 1",
                options.character,
                selector.modulus()
            );
        }
        let panel = ParameterPanel::new(&theme);
        let mut app = Self {
            backend,
            events,
            selector,
            viewport: Viewport::new(options.start, options.end),
            view: options.view,
            real_part: options.real_part,
            clt_start: options.clt_start,
            clt_end: options.clt_end,
            samples: options.samples,
            scans: RequestOrchestrator::new(),
            points: RequestOrchestrator::new(),
            charts: ChartLifecycleManager::new(),
            panel,
            point: None,
            histogram_summary: None,
            status: None,
            last_error: None,
            hover: None,
            info_visible: options.show_info,
            debug: DebugState {
                enabled: options.debug,
                ..DebugState::default()
            },
            theme,
            options,
        };
        app.sync_fields();
        app
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn selector(&self) -> &CharacterSelector {
        &self.selector
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn charts(&self) -> &ChartLifecycleManager {
        &self.charts
    }

    pub fn requests(&self) -> &RequestOrchestrator {
        &self.scans
    }

    pub fn is_loading(&self) -> bool {
        self.scans.is_loading()
    }

    pub fn focus(&self) -> Focus {
        self.panel.focus()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn point(&self) -> Option<&PointValue> {
        self.point.as_ref()
    }

    pub fn histogram_summary(&self) -> Option<&str> {
        self.histogram_summary.as_deref()
    }

    pub fn event(&mut self, event: AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(&key),
            AppEvent::Mouse(mouse) => self.mouse(&mouse),
            AppEvent::Refresh => {
                self.refresh();
                None
            }
            AppEvent::Fetched(completion) => {
                self.fetched(completion);
                None
            }
            AppEvent::Resize(_, _) | AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);
        match interaction::map_key(event, self.panel.focus()) {
            Some(action) => self.apply(action),
            None => {
                if let Some(input) = self.panel.focused_input_mut() {
                    input.handle_key(event);
                }
                None
            }
        }
    }

    fn mouse(&mut self, event: &MouseEvent) -> Option<AppEvent> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let x = self
                    .charts
                    .instance_at(event.column, event.row)
                    .and_then(|i| interaction::resolve_click(i, event.column, event.row))?;
                self.apply(Action::ZoomTo(x))
            }
            MouseEventKind::Moved => {
                self.hover = self
                    .charts
                    .instance_at(event.column, event.row)
                    .and_then(|i| {
                        let x = i.geometry?.column_to_x(event.column)?;
                        Some((i.surface, x))
                    });
                None
            }
            _ => None,
        }
    }

    /// Carry out `action`. Parameter changes come back as a follow-up
    /// `Refresh` so the new request goes through the event loop.
    pub fn apply(&mut self, action: Action) -> Option<AppEvent> {
        let changed = match action {
            Action::Quit => return Some(AppEvent::Exit),
            Action::ResetZoom => {
                self.viewport.reset();
                true
            }
            Action::ZoomTo(x) => {
                self.viewport.zoom_to(x);
                true
            }
            Action::ModulusStep(delta) => {
                let q = (self.selector.modulus() as i64)
                    .saturating_add(delta)
                    .max(1) as u64;
                let changed = q != self.selector.modulus();
                self.selector.set_modulus(q);
                changed
            }
            Action::EndStep(steps) => {
                self.viewport
                    .nudge_end(steps as f64 * self.options.end_step);
                true
            }
            Action::CharacterStep(step) => {
                if step > 0 {
                    self.selector.select_next()
                } else {
                    self.selector.select_prev()
                }
            }
            Action::FocusNext => {
                self.sync_fields();
                self.panel.set_focus(self.panel.focus().next());
                false
            }
            Action::FocusPrev => {
                self.sync_fields();
                self.panel.set_focus(self.panel.focus().prev());
                false
            }
            Action::Blur => {
                self.sync_fields();
                self.panel.set_focus(Focus::Chart);
                false
            }
            Action::Submit => self.commit_field(self.panel.focus()),
            Action::CycleView { forward } => {
                self.view = if forward {
                    self.view.next()
                } else {
                    self.view.prev()
                };
                self.hover = None;
                true
            }
            Action::Refresh => true,
            Action::Export => {
                self.export();
                false
            }
            Action::EvaluatePoint => {
                self.evaluate_point();
                false
            }
            Action::ToggleInfo => {
                self.info_visible = !self.info_visible;
                false
            }
        };
        if changed && (action.refetches() || action == Action::Submit) {
            self.sync_fields();
            Some(AppEvent::Refresh)
        } else {
            None
        }
    }

    /// Apply the text of `field`. Returns whether a parameter changed.
    fn commit_field(&mut self, field: Focus) -> bool {
        let text = self.panel.value(field).to_string();
        let changed = match field {
            Focus::Modulus => {
                let q = residues::parse_modulus(&text);
                let changed = q != self.selector.modulus();
                self.selector.set_modulus(q);
                changed
            }
            Focus::Start => Self::commit_bound(&text, self.viewport.start(), |v| {
                self.viewport.set_start(v)
            }),
            Focus::End => {
                Self::commit_bound(&text, self.viewport.end(), |v| self.viewport.set_end(v))
            }
            Focus::RealPart => {
                Self::commit_bound(&text, self.real_part, |v| self.real_part = v)
            }
            Focus::CltStart => {
                Self::commit_bound(&text, self.clt_start, |v| self.clt_start = v)
            }
            Focus::CltEnd => Self::commit_bound(&text, self.clt_end, |v| self.clt_end = v),
            Focus::Samples => match text.trim().parse::<usize>() {
                Ok(n) if n > 0 => {
                    let changed = n != self.samples;
                    self.samples = n;
                    changed
                }
                _ => {
                    log::warn!("ignoring sample count {:?}", text);
                    false
                }
            },
            Focus::Character | Focus::Chart => true,
        };
        self.sync_fields();
        changed
    }

    fn commit_bound(text: &str, current: f64, set: impl FnOnce(f64)) -> bool {
        match form::parse_bound(text) {
            Some(v) => {
                set(v);
                v != current
            }
            None => {
                log::warn!("ignoring bound {:?}, keeping {}", text, current);
                false
            }
        }
    }

    fn sync_fields(&mut self) {
        self.panel.sync(&FieldValues {
            modulus: self.selector.modulus(),
            start: self.viewport.start(),
            end: self.viewport.end(),
            real_part: self.real_part,
            clt_start: self.clt_start,
            clt_end: self.clt_end,
            samples: self.samples,
        });
    }

    /// The request that fetches data for the current view.
    pub fn current_request(&self) -> BackendRequest {
        let modulus = self.selector.modulus();
        let (start, end) = (self.viewport.start(), self.viewport.end());
        match self.view {
            ViewMode::Real | ViewMode::Complex => BackendRequest::Scan(backend::ScanQuery {
                real_part: self.real_part,
                start,
                end,
                modulus,
                character: self.selector.selected(),
                steps: request::scan_steps(start, end),
            }),
            ViewMode::Overlay | ViewMode::Grid => BackendRequest::ScanAll {
                start,
                end,
                modulus,
            },
            ViewMode::Clt => BackendRequest::Clt {
                modulus,
                character: self.selector.selected(),
                start: self.clt_start,
                end: self.clt_end,
                samples: self.samples,
            },
        }
    }

    fn refresh(&mut self) {
        let request = self.current_request();
        let ticket = self.scans.issue(&request);
        self.debug.requests_issued = self.scans.issued() + self.points.issued();
        request::spawn(self.backend.clone(), ticket, request, self.events.clone());
    }

    /// Evaluate L at r + i·t, t the middle of the current range.
    fn evaluate_point(&mut self) {
        let request = BackendRequest::Point {
            real_part: self.real_part,
            imag: (self.viewport.start() + self.viewport.end()) / 2.0,
            modulus: self.selector.modulus(),
        };
        let ticket = self.points.issue(&request);
        self.debug.requests_issued = self.scans.issued() + self.points.issued();
        request::spawn(self.backend.clone(), ticket, request, self.events.clone());
    }

    fn scan_context(&self) -> ScanContext {
        ScanContext {
            modulus: self.selector.modulus(),
            character_label: self
                .selector
                .selected_residue()
                .map(|r| r.label())
                .unwrap_or_else(|| "1".to_string()),
            real_part: self.real_part,
        }
    }

    fn fetched(&mut self, completion: Completion) {
        if matches!(completion.request, BackendRequest::Point { .. }) {
            match self.points.complete(completion) {
                Resolution::Render(Payload::Point(point)) => {
                    self.point = Some(point);
                    self.last_error = None;
                }
                Resolution::Render(_) => {}
                Resolution::Failed(message) => self.last_error = Some(message),
                Resolution::Stale => {}
            }
            return;
        }

        match self.scans.complete(completion) {
            Resolution::Render(payload) => {
                self.last_error = None;
                self.render_payload(payload);
            }
            Resolution::Failed(message) => self.last_error = Some(message),
            Resolution::Stale => {}
        }
        self.debug.stale_dropped = self.scans.stale_dropped();
        self.debug.live_charts = self.charts.live_count();
    }

    fn render_payload(&mut self, payload: Payload) {
        let ctx = self.scan_context();
        match payload {
            Payload::Scan(points) => {
                let spec = if self.view == ViewMode::Complex {
                    series::complex_chart(&points, &ctx)
                } else {
                    series::real_part_chart(&points, &ctx)
                };
                self.charts.clear_secondary();
                self.charts.render_primary(spec);
            }
            Payload::ScanAll(all) => {
                if self.view == ViewMode::Grid {
                    self.charts.clear_primary();
                    self.charts.render_secondary(series::grid_charts(&all));
                } else {
                    self.charts.clear_secondary();
                    self.charts
                        .render_primary(series::overlay_chart(&all, ctx.modulus));
                }
            }
            Payload::Clt(samples) => {
                let hist = Histogram::from_samples(&samples);
                self.histogram_summary = Some(hist.summary());
                self.charts.clear_secondary();
                self.charts
                    .render_primary(series::histogram_chart(&hist, &ctx));
            }
            Payload::Point(point) => self.point = Some(point),
        }
    }

    fn export(&mut self) {
        let Some(instance) = self
            .charts
            .primary()
            .or_else(|| self.charts.secondary().next())
        else {
            self.status = Some("Nothing to export".to_string());
            return;
        };
        let format = self.options.export_format;
        let path = chart_export::export_path(
            self.options.export_dir.as_deref(),
            self.view,
            self.selector.modulus(),
            format,
        );
        match chart_export::export_chart(&instance.spec, format, &path, self.options.export_size)
        {
            Ok(()) => {
                self.status = Some(format!("Exported {}", path.display()));
            }
            Err(e) => {
                log::error!("export to {} failed: {:#}", path.display(), e);
                self.last_error = Some(format!("Export failed: {}", e));
            }
        }
    }

    fn info_rows(&self) -> Vec<(&'static str, String)> {
        let q = self.selector.modulus();
        let mut rows = vec![
            (
                "Modulus",
                format!("{} (phi = {})", q, self.selector.len()),
            ),
            (
                "Character",
                self.selector
                    .selected_residue()
                    .map(|r| format!("{}. Chi {}", r.index, r.label()))
                    .unwrap_or_default(),
            ),
            (
                "Range",
                format!("[{}, {}]", self.viewport.start(), self.viewport.end()),
            ),
            ("Re(s)", self.real_part.to_string()),
        ];
        if let Some(point) = &self.point {
            rows.push(("Point", widgets::info::format_point(point)));
        }
        if self.view == ViewMode::Clt {
            if let Some(summary) = &self.histogram_summary {
                rows.push(("Samples", summary.clone()));
            }
        }
        rows.push((
            "Requests",
            format!(
                "{} issued, {} failed",
                self.scans.issued() + self.points.issued(),
                self.scans.failures() + self.points.failures()
            ),
        ));
        rows
    }

    fn render_charts(&mut self, area: Rect, buf: &mut Buffer) {
        let focused = self.panel.focus() == Focus::Chart;
        let hover = self.hover;
        let hover_for = |surface: Surface| hover.filter(|(s, _)| *s == surface).map(|(_, x)| x);
        let mut placed = Vec::new();

        if self.charts.secondary_count() > 0 {
            let count = self.charts.secondary_count();
            let columns = self.options.grid_columns.max(1).min(count);
            let rows = count.div_ceil(columns);
            let row_areas = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
                .split(area);
            let cells: Vec<Rect> = row_areas
                .iter()
                .flat_map(|row| {
                    Layout::default()
                        .direction(Direction::Horizontal)
                        .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
                        .split(*row)
                        .to_vec()
                })
                .collect();
            for (instance, cell) in self.charts.secondary().zip(cells) {
                let view = ChartView {
                    spec: &instance.spec,
                    theme: &self.theme,
                    focused,
                    hover: hover_for(instance.surface),
                    default_ticks: self.options.max_x_ticks,
                };
                placed.push((instance.surface, render_chart(&view, cell, buf)));
            }
        } else if let Some(instance) = self.charts.primary() {
            let view = ChartView {
                spec: &instance.spec,
                theme: &self.theme,
                focused,
                hover: hover_for(Surface::Primary),
                default_ticks: self.options.max_x_ticks,
            };
            placed.push((Surface::Primary, render_chart(&view, area, buf)));
        } else {
            let text = if self.scans.is_loading() {
                "Loading..."
            } else {
                "No data"
            };
            Paragraph::new(text)
                .style(Style::default().fg(self.theme.get("text_secondary")))
                .centered()
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(self.theme.get("border"))),
                )
                .render(area, buf);
        }

        for (surface, geometry) in placed {
            self.charts.set_geometry(surface, geometry);
        }
    }

    fn controls(&self) -> Controls {
        let mut controls = Controls::new().with_colors(
            self.theme.get("controls_bg"),
            self.theme.get("primary"),
            self.theme.get("text_primary"),
        );
        if self.panel.focus().is_text_entry() {
            controls = controls.with_custom_controls(vec![
                ("Enter", "Apply"),
                ("Esc", "Leave"),
                ("Tab", "Next field"),
                ("C-c", "Quit"),
            ]);
        }
        if self.scans.is_loading() {
            controls = controls.with_status("loading...");
        } else if let Some(err) = &self.last_error {
            controls = controls
                .with_status(err.lines().next().unwrap_or_default().to_string())
                .with_status_color(self.theme.get("warning"));
        } else if let Some(status) = &self.status {
            controls = controls.with_status(status.clone());
        }
        controls
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;
        self.debug.live_charts = self.charts.live_count();

        let mut constraints = vec![Constraint::Fill(1), Constraint::Length(1)];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(PARAMS_WIDTH), Constraint::Fill(1)])
            .split(layout[0]);

        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(if self.info_visible { INFO_HEIGHT } else { 0 }),
            ])
            .split(main[0]);

        let params = ParamsView {
            panel: &self.panel,
            selector: &self.selector,
            view: self.view,
            loading: self.scans.is_loading(),
            theme: &self.theme,
        };
        (&params).render(side[0], buf);

        if self.info_visible {
            let info = InfoPanel {
                rows: self.info_rows(),
                error: self.last_error.as_deref(),
                border: self.theme.get("border"),
                label: self.theme.get("text_secondary"),
                error_color: self.theme.get("error"),
            };
            (&info).render(side[1], buf);
        }

        self.render_charts(main[1], buf);

        let controls = self
            .controls()
            .with_dimmed(self.scans.is_loading(), self.theme.get("dimmed"));
        controls.render(layout[1], buf);

        if self.debug.enabled && layout.len() > 2 {
            self.debug.render(layout[2], buf);
        }
    }
}

/// Build the app from config and command-line arguments.
pub fn build_app(
    events: Sender<AppEvent>,
    config: &AppConfig,
    args: &Args,
) -> Result<App> {
    let theme = Theme::from_config(&config.theme)?;
    let mut options = AppOptions::from_config(config);
    options.apply_args(args);
    let url = args
        .backend_url
        .clone()
        .unwrap_or_else(|| config.backend.url.clone());
    log::info!("backend {}", url);
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&url));
    Ok(App::new(events, backend, theme, options))
}

use std::collections::HashSet;
use std::io::stdout;
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, info, warn};

use crate::cli::{Config, Input};
use crate::debounce::Debounced;
use crate::error::TreeError;
use crate::loader::{LoadResult, Loader};
use crate::navigation;
use crate::product::{AnnotatedRow, ProductRow, ProductType};
use crate::renderer::{self, LoadStatus, TableView};
use crate::session::{
    load_state, save_state, FileSessionStore, MemorySessionStore, PersistedState, SessionStore,
};
use crate::sort::SortColumn;
use crate::source::{default_dataset, discover_datasets, DataSource};
use crate::tint::AxisTints;
use crate::tree::{self, ViewOptions};
use crate::watcher::{DatasetWatcher, WatchEvent};

/// Debounce applied to dataset file change notifications.
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

/// One selectable row source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dataset {
    pub label: String,
    pub source: DataSource,
}

/// Expand the configured input into the datasets the user can switch
/// between, plus the index to start with.
pub fn resolve_datasets(input: &Input) -> Result<(Vec<Dataset>, usize)> {
    match input {
        Input::File(path) => {
            let label = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok((
                vec![Dataset {
                    label,
                    source: DataSource::File(path.clone()),
                }],
                0,
            ))
        }
        Input::Directory { dir, pattern } => {
            let entries = discover_datasets(dir, pattern)?;
            let Some(start) = default_dataset(&entries) else {
                anyhow::bail!(
                    "No datasets matching {:?} found in {}",
                    pattern,
                    dir.display()
                );
            };
            let datasets = entries
                .into_iter()
                .map(|entry| Dataset {
                    label: entry.label,
                    source: DataSource::File(entry.path),
                })
                .collect();
            Ok((datasets, start))
        }
        Input::Remote {
            base_url,
            scope,
            technical_id,
        } => Ok((
            vec![Dataset {
                label: format!("{} {}", scope.as_str(), technical_id),
                source: DataSource::Http {
                    base_url: base_url.clone(),
                    scope: *scope,
                    technical_id: technical_id.clone(),
                },
            }],
            0,
        )),
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// One view session: the loaded rows plus everything the user can change.
pub struct App {
    config: Config,
    datasets: Vec<Dataset>,
    dataset_index: usize,
    loader: Loader,
    store: Box<dyn SessionStore>,
    status: LoadStatus,

    /// Loaded rows; replaced wholesale on (re)load, never edited.
    rows: Vec<ProductRow>,
    root_id: Option<String>,
    restored_root: Option<String>,
    tints: AxisTints,
    submodels: Vec<String>,
    expandable: HashSet<String>,

    options: ViewOptions,
    /// Text in the search box; applied to `options.query` once settled.
    search: Debounced<String>,
    search_input: String,
    search_active: bool,

    /// Final row sequence for the current rows and options.
    view: Vec<AnnotatedRow>,
    selected: usize,
    scroll_offset: usize,
    viewport_height: usize,

    message: Option<String>,
    last_error: Option<String>,
    watcher: Option<(DatasetWatcher, mpsc::Receiver<WatchEvent>)>,
    running: bool,
}

impl App {
    /// Build a new `App` from the resolved configuration.
    pub fn new(config: Config) -> Result<Self> {
        let (datasets, dataset_index) = resolve_datasets(&config.input)?;

        let store: Box<dyn SessionStore> = match &config.state_file {
            Some(path) => {
                let store = FileSessionStore::open(path);
                info!(path = %store.path().display(), "view state file");
                Box::new(store)
            }
            None => Box::new(MemorySessionStore::default()),
        };

        let options = config.initial_view.clone();
        let search = Debounced::new(options.query.clone(), config.search_debounce);
        let search_input = options.query.clone();

        Ok(Self {
            config,
            datasets,
            dataset_index,
            loader: Loader::new(),
            store,
            status: LoadStatus::Loading,
            rows: Vec::new(),
            root_id: None,
            restored_root: None,
            tints: AxisTints::default(),
            submodels: Vec::new(),
            expandable: HashSet::new(),
            options,
            search,
            search_input,
            search_active: false,
            view: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            viewport_height: 0,
            message: None,
            last_error: None,
            watcher: None,
            running: true,
        })
    }

    fn dataset(&self) -> &Dataset {
        &self.datasets[self.dataset_index]
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Request the current dataset and watch its file for changes.
    fn start_load(&mut self) {
        self.status = LoadStatus::Loading;
        let source = self.dataset().source.clone();
        self.loader.request(source.clone());

        self.watcher = None;
        if self.config.watch {
            if let Some(path) = source.file_path() {
                self.watch(path);
            }
        }
    }

    fn watch(&mut self, path: &Path) {
        match DatasetWatcher::new(path, RELOAD_DEBOUNCE) {
            Ok(watcher) => self.watcher = Some(watcher),
            Err(e) => warn!(path = %path.display(), error = %e, "cannot watch dataset"),
        }
    }

    fn on_load(&mut self, result: LoadResult) {
        match result {
            Ok(rows) => {
                if let Err(e) = self.set_rows(rows) {
                    warn!(error = %e, "dataset rejected");
                    self.status = LoadStatus::Failed(e.to_string());
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    transport = e.is_transport(),
                    dataset = %self.dataset().label,
                    "fetch failed"
                );
                self.status = LoadStatus::Failed(e.to_string());
            }
        }
    }

    /// Install a freshly loaded row set and rebuild everything derived
    /// from it.
    fn set_rows(&mut self, rows: Vec<ProductRow>) -> Result<(), TreeError> {
        let root_id = tree::get_root_identifier(&rows)?.to_string();

        self.tints = AxisTints::from_rows(&rows);
        self.submodels = tree::submodel_ids(&rows);
        self.expandable = tree::parents_with_children(&rows)
            .into_iter()
            .map(str::to_string)
            .collect();
        self.rows = rows;

        // Restore once per root; reloads of the same tree keep the live state.
        // A root without saved state starts from the configured view.
        if self.restored_root.as_deref() != Some(root_id.as_str()) {
            let options = match load_state(self.store.as_ref(), &root_id) {
                Some(state) => {
                    info!(root = %root_id, "restored view state");
                    state.into_options()
                }
                None => self.config.initial_view.clone(),
            };
            self.apply_options(options);
            self.restored_root = Some(root_id.clone());
        }

        self.root_id = Some(root_id);
        self.status = LoadStatus::Ready;
        self.refresh();
        self.persist();
        Ok(())
    }

    fn apply_options(&mut self, options: ViewOptions) {
        self.search_input = options.query.clone();
        self.search.set_now(options.query.clone());
        self.options = options;
        self.selected = 0;
        self.scroll_offset = 0;
    }

    // ------------------------------------------------------------------
    // Derived view
    // ------------------------------------------------------------------

    /// Recompute the final rows, keeping the cursor on the same row when it
    /// survives.
    fn refresh(&mut self) {
        let selected_id = self.view.get(self.selected).map(|r| r.identifier.clone());
        self.view = tree::compute_rows(&self.rows, &self.options);

        self.selected = selected_id
            .and_then(|id| self.view.iter().position(|r| r.identifier == id))
            .unwrap_or(self.selected)
            .min(self.view.len().saturating_sub(1));
        self.keep_selection_visible();
        debug!(rows = self.view.len(), query = %self.options.query, "view recomputed");
    }

    fn persist(&mut self) {
        if let Some(root_id) = &self.root_id {
            save_state(
                self.store.as_mut(),
                root_id,
                &PersistedState::capture(&self.options),
            );
        }
    }

    /// Recompute and save after a user-driven state change.
    fn changed(&mut self) {
        self.refresh();
        self.persist();
    }

    fn keep_selection_visible(&mut self) {
        let height = self.viewport_height.max(1);
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
        let max_scroll = self.view.len().saturating_sub(height);
        self.scroll_offset = self.scroll_offset.min(max_scroll);
    }

    fn selected_row(&self) -> Option<&AnnotatedRow> {
        self.view.get(self.selected)
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    fn toggle_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        if row.product_type == ProductType::Submodel && self.expandable.contains(&row.identifier) {
            let id = row.identifier.clone();
            self.options.collapsed.toggle(&id);
            self.changed();
        }
    }

    fn expand_all(&mut self) {
        self.options.collapsed.expand_all();
        self.changed();
    }

    fn collapse_all(&mut self) {
        let ids = self.submodels.clone();
        self.options.collapsed.collapse_all(ids);
        self.changed();
    }

    fn sort_by(&mut self, column: SortColumn) {
        self.options.sort.click(column);
        self.changed();
    }

    fn toggle_show_hidden(&mut self) {
        self.options.show_hidden = !self.options.show_hidden;
        self.changed();
    }

    fn open_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        match navigation::open_row(&self.config.base_url, row) {
            Ok(url) => self.message = Some(format!("Opened {}", url)),
            Err(e) => {
                warn!(error = %e, "failed to open row");
                self.last_error = Some(format!("{:#}", e));
            }
        }
    }

    fn next_dataset(&mut self) {
        if self.datasets.len() > 1 {
            self.dataset_index = (self.dataset_index + 1) % self.datasets.len();
            info!(dataset = %self.dataset().label, "switching dataset");
            self.start_load();
        }
    }

    /// Record a keystroke in the search box; applied after the debounce.
    fn edit_search(&mut self, now: Instant) {
        self.search.set(self.search_input.clone(), now);
    }

    /// Promote a settled search query into the view options.
    fn poll_search(&mut self, now: Instant) {
        if self.search.poll(now) {
            self.options.query = self.search.get().clone();
            self.selected = 0;
            self.scroll_offset = 0;
            self.changed();
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.view.is_empty() {
            return;
        }
        let last = self.view.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
        self.keep_selection_visible();
    }

    // ------------------------------------------------------------------
    // Key handling
    // ------------------------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        // Ctrl+C always quits, regardless of search state.
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return;
        }

        self.message = None;
        let half_page = (self.viewport_height / 2).max(1) as isize;

        if self.search_active {
            // Search input mode: typing into the search bar.
            match key.code {
                KeyCode::Esc => {
                    self.search_active = false;
                    self.search_input.clear();
                    self.search.set_now(String::new());
                    if !self.options.query.is_empty() {
                        self.options.query.clear();
                        self.changed();
                    }
                }
                KeyCode::Enter => {
                    self.search_active = false;
                }
                KeyCode::Backspace => {
                    self.search_input.pop();
                    self.edit_search(now);
                }
                KeyCode::Char(c) => {
                    self.search_input.push(c);
                    self.edit_search(now);
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.running = false,
            KeyCode::Esc if !self.search_input.is_empty() => {
                self.search_input.clear();
                self.search.set_now(String::new());
                self.options.query.clear();
                self.changed();
            }
            KeyCode::Char('/') => self.search_active = true,
            KeyCode::Char('h') => self.toggle_show_hidden(),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_selected(),
            KeyCode::Char('e') => self.expand_all(),
            KeyCode::Char('c') => self.collapse_all(),
            KeyCode::Char('1') => self.sort_by(SortColumn::Identifier),
            KeyCode::Char('2') => self.sort_by(SortColumn::Label),
            KeyCode::Char('3') => self.sort_by(SortColumn::Variant),
            KeyCode::Char('o') => self.open_selected(),
            KeyCode::Char('r') => self.start_load(),
            KeyCode::Tab => self.next_dataset(),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::PageDown => self.move_selection(half_page),
            KeyCode::PageUp => self.move_selection(-half_page),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(half_page)
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(-half_page)
            }
            KeyCode::Char('g') | KeyCode::Home => self.move_selection(isize::MIN),
            KeyCode::Char('G') | KeyCode::End => self.move_selection(isize::MAX),
            _ => {}
        }
    }

    fn table_view(&self) -> TableView<'_> {
        TableView {
            title: tree::get_root_label(&self.rows),
            dataset_label: &self.dataset().label,
            dataset_position: (self.dataset_index + 1, self.datasets.len()),
            status: &self.status,
            rows: &self.view,
            total_rows: self.rows.len(),
            tints: &self.tints,
            sort: self.options.sort,
            query: &self.options.query,
            search_input: &self.search_input,
            search_active: self.search_active,
            search_pending: self.search.is_pending(),
            show_hidden: self.options.show_hidden,
            collapsed: &self.options.collapsed,
            expandable: &self.expandable,
            highlight_technical_id: self.config.highlight_technical_id.as_deref(),
            selected: self.selected,
            scroll_offset: self.scroll_offset,
            message: self.message.as_deref(),
            last_error: self.last_error.as_deref(),
        }
    }

    // ------------------------------------------------------------------
    // Main loop
    // ------------------------------------------------------------------

    /// Run the TUI event loop.
    pub fn run(&mut self) -> Result<()> {
        // 1. Kick off the first fetch before taking over the terminal.
        self.start_load();

        // 2. Set up the terminal.
        enable_raw_mode()?;
        let mut out = stdout();
        execute!(out, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(out);
        let mut terminal = Terminal::new(backend)?;

        // 3. Main loop.
        let result = self.event_loop(&mut terminal);

        // 4. Cleanup: restore the terminal.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    ) -> Result<()> {
        while self.running {
            // --- Fetch results ---
            if let Some(result) = self.loader.try_recv() {
                self.on_load(result);
            }

            // --- Debounced search ---
            self.poll_search(Instant::now());

            // --- Draw ---
            let mut viewport_out = 0;
            terminal.draw(|frame| {
                viewport_out = renderer::render_ui(frame, &self.table_view());
            })?;
            if viewport_out != self.viewport_height {
                self.viewport_height = viewport_out;
                self.keep_selection_visible();
            }

            // --- Handle keyboard events ---
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key, Instant::now());
                    }
                }
            }

            // --- Dataset file changes (non-blocking) ---
            let mut reload = false;
            if let Some((_, rx)) = &self.watcher {
                while let Ok(event) = rx.try_recv() {
                    match event {
                        WatchEvent::DatasetChanged => reload = true,
                        WatchEvent::Error(e) => self.last_error = Some(e),
                    }
                }
            }
            if reload {
                info!(dataset = %self.dataset().label, "dataset changed on disk, reloading");
                self.start_load();
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

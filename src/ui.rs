use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::collections::BTreeMap;
use std::io;
use transaction_flagger::report::Breakdown;
use transaction_flagger::{format_amount, CleaningReport, DetectorKind, Evaluation, TransactionRecord};

const DETECTOR_KEYS: [DetectorKind; 5] = [
    DetectorKind::HighValue,
    DetectorKind::RapidSuccession,
    DetectorKind::StatisticalOutlier,
    DetectorKind::Weekend,
    DetectorKind::RiskyMerchant,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Accounts,
    Ledger,
    Views,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterType {
    None,
    FlaggedOnly,
    ByDetector(DetectorKind),
}

#[derive(Debug, Clone)]
pub struct FilterState {
    pub active_filter: FilterType,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Accounts => Page::Ledger,
            Page::Ledger => Page::Views,
            Page::Views => Page::Accounts,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Accounts => Page::Views,
            Page::Ledger => Page::Accounts,
            Page::Views => Page::Ledger,
        }
    }
}

/// Per-account row of the Accounts page
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRow {
    pub account_id: String,
    pub count: usize,
    pub total: f64,
    pub flagged: usize,
}

pub struct App {
    pub evaluation: Evaluation,
    pub breakdown: Breakdown,
    pub cleaning: CleaningReport,
    /// Indices into `evaluation.records` currently shown in the ledger
    pub visible: Vec<usize>,
    pub state: TableState,
    pub current_page: Page,
    pub accounts: Vec<AccountRow>,
    pub accounts_state: TableState,
    pub show_detail: bool,
    pub filter_state: FilterState,
}

impl App {
    pub fn new(evaluation: Evaluation, cleaning: CleaningReport) -> Self {
        let mut state = TableState::default();
        if !evaluation.records.is_empty() {
            state.select(Some(0));
        }

        let accounts = account_rows(&evaluation);
        let mut accounts_state = TableState::default();
        if !accounts.is_empty() {
            accounts_state.select(Some(0));
        }

        let visible = (0..evaluation.records.len()).collect();
        let breakdown = Breakdown::from_evaluation(&evaluation);

        Self {
            evaluation,
            breakdown,
            cleaning,
            visible,
            state,
            current_page: Page::Ledger,
            accounts,
            accounts_state,
            show_detail: false,
            filter_state: FilterState {
                active_filter: FilterType::None,
            },
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_record(&self) -> Option<&TransactionRecord> {
        self.state
            .selected()
            .and_then(|i| self.visible.get(i))
            .and_then(|&idx| self.evaluation.records.get(idx))
    }

    pub fn apply_filter(&mut self, filter: FilterType) {
        self.filter_state.active_filter = filter.clone();

        let evaluation = &self.evaluation;
        self.visible = evaluation
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| match &filter {
                FilterType::None => true,
                FilterType::FlaggedOnly => evaluation.is_flagged(r.id),
                FilterType::ByDetector(kind) => evaluation
                    .hits
                    .get(kind)
                    .is_some_and(|ids| ids.contains(&r.id)),
            })
            .map(|(idx, _)| idx)
            .collect();

        // Reset selection to first item
        if !self.visible.is_empty() {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(FilterType::None);
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    /// Table the navigation keys act on, with its row count. None on Views.
    fn cursor(&mut self) -> Option<(&mut TableState, usize)> {
        match self.current_page {
            Page::Accounts => Some((&mut self.accounts_state, self.accounts.len())),
            Page::Ledger => Some((&mut self.state, self.visible.len())),
            Page::Views => None,
        }
    }

    pub fn next(&mut self) {
        let Some((state, len)) = self.cursor() else { return };
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let Some((state, len)) = self.cursor() else { return };
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let Some((state, len)) = self.cursor() else { return };
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let Some((state, len)) = self.cursor() else { return };
        if len == 0 {
            return;
        }
        let i = state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        state.select(Some(i));
    }

    pub fn first(&mut self) {
        if let Some((state, len)) = self.cursor() {
            if len > 0 {
                state.select(Some(0));
            }
        }
    }

    pub fn last(&mut self) {
        if let Some((state, len)) = self.cursor() {
            if len > 0 {
                state.select(Some(len - 1));
            }
        }
    }
}

/// Accounts ordered by flagged count, then transaction count
fn account_rows(evaluation: &Evaluation) -> Vec<AccountRow> {
    let mut rows: BTreeMap<&str, AccountRow> = BTreeMap::new();

    for record in &evaluation.records {
        let row = rows
            .entry(record.account_id.as_str())
            .or_insert_with(|| AccountRow {
                account_id: record.account_id.clone(),
                count: 0,
                total: 0.0,
                flagged: 0,
            });
        row.count += 1;
        row.total += record.amount;
        if evaluation.is_flagged(record.id) {
            row.flagged += 1;
        }
    }

    let mut result: Vec<AccountRow> = rows.into_values().collect();
    result.sort_by(|a, b| b.flagged.cmp(&a.flagged).then_with(|| b.count.cmp(&a.count)));
    result
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('c') => {
                    app.clear_filter();
                    app.current_page = Page::Ledger;
                }
                KeyCode::Char('f') => {
                    app.apply_filter(FilterType::FlaggedOnly);
                    app.current_page = Page::Ledger;
                }
                KeyCode::Char(c @ '1'..='5') if app.current_page == Page::Views => {
                    let idx = (c as u8 - b'1') as usize;
                    app.apply_filter(FilterType::ByDetector(DETECTOR_KEYS[idx]));
                    app.current_page = Page::Ledger;
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page == Page::Ledger {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Accounts => render_accounts(f, chunks[1], app),
            Page::Ledger => render_table(f, chunks[1], app),
            Page::Views => render_views(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn label(text: &str) -> Span<'static> {
    Span::styled(
        format!("  {}: ", text),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let metrics = &app.evaluation.metrics;

    let pages = [
        (Page::Accounts, "Accounts"),
        (Page::Ledger, "Ledger"),
        (Page::Views, "Views"),
    ];

    let mut tab_spans = vec![];
    for (i, (page, name)) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(*name, style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {}", metrics.total_count),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!(
            "🚩 {} ({:.1}%)",
            metrics.flagged_count, metrics.flagged_percentage
        ),
        Style::default().fg(Color::Red),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Dropped: {}", app.cleaning.rows_dropped),
        Style::default().fg(Color::DarkGray),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["", "Date", "Account", "Merchant", "Amount", "Type"]
        .iter()
        .map(|h| Cell::from(*h).style(header_style()));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let evaluation = &app.evaluation;
    let rows = app.visible.iter().map(|&idx| {
        let record = &evaluation.records[idx];
        let flagged = evaluation.is_flagged(record.id);
        let color = if flagged { Color::Red } else { Color::White };

        let cells = vec![
            Cell::from(if flagged { "🚩" } else { "  " }),
            Cell::from(
                record
                    .timestamp
                    .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::from(truncate(&record.account_id, 16)),
            Cell::from(truncate(&record.merchant, 30)),
            Cell::from(format!("{:.2}", record.amount)).style(Style::default().fg(color)),
            Cell::from(truncate(&record.transaction_type, 15)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(17),
            Constraint::Length(18),
            Constraint::Length(32),
            Constraint::Length(12),
            Constraint::Length(17),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Transactions "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.visible.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if app.filter_state.active_filter != FilterType::None {
        let filter_name = match &app.filter_state.active_filter {
            FilterType::FlaggedOnly => "Flagged",
            FilterType::ByDetector(kind) => kind.name(),
            FilterType::None => "",
        };
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", filter_name),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    for (key, text) in [
        ("Enter", " Details | "),
        ("f", " Flagged | "),
        ("Tab", " Page | "),
        ("↑/↓", " Nav | "),
        ("PgUp/PgDn", " Fast | "),
    ] {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(text));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn render_accounts(f: &mut Frame, area: Rect, app: &mut App) {

    let header_cells = ["Account", "Transactions", "Total Amount", "Flagged"]
        .iter()
        .map(|h| Cell::from(*h).style(header_style()));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.accounts.iter().map(|row| {
        let color = if row.flagged > 0 { Color::Red } else { Color::Green };

        Row::new(vec![
            Cell::from(truncate(&row.account_id, 24)),
            Cell::from(format!("{}", row.count)),
            Cell::from(format!("{:.2}", row.total)),
            Cell::from(format!("{}", row.flagged)).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(25),
            Constraint::Length(15),
            Constraint::Length(18),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Accounts - Summary by Account "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.accounts_state);
}

fn render_views(f: &mut Frame, area: Rect, app: &App) {
    let evaluation = &app.evaluation;
    let metrics = &evaluation.metrics;

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Summary Metrics",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            label("Average"),
            Span::raw(format_amount(metrics.mean_amount)),
            label("Max"),
            Span::raw(format_amount(metrics.max_amount)),
            label("Min"),
            Span::raw(format_amount(metrics.min_amount)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  Detectors",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (i, kind) in DETECTOR_KEYS.iter().enumerate() {
        let selected = app.filter_state.active_filter == FilterType::ByDetector(*kind);
        let (count, color) = match evaluation.hits.get(kind) {
            Some(ids) => (format!("{:>5} txs", ids.len()), Color::White),
            None => ("  off".to_string(), Color::DarkGray),
        };

        content.push(Line::from(vec![
            if selected {
                Span::styled("  →", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            } else {
                Span::raw("   ")
            },
            Span::styled(format!("{}", i + 1), Style::default().fg(Color::Yellow)),
            Span::raw(format!(". {:<20}", kind.name())),
            Span::styled(count, Style::default().fg(color)),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Amount by Type",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )));
    for row in app.breakdown.by_type.iter().take(5) {
        content.push(Line::from(format!("    {:<20} {:>14.2}", row.key, row.total)));
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Top Merchants",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )));
    for row in &app.breakdown.top_merchants {
        content.push(Line::from(format!("    {:<20} {:>14.2}", truncate(&row.key, 20), row.total)));
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![
        Span::styled(
            "  Hint: ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        ),
        Span::styled(
            "Press 1-5 to show one detector's hits, c to clear",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ),
    ]));

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Views - Detectors & Breakdown "),
    );

    f.render_widget(paragraph, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Transaction Details ");

    let Some(record) = app.selected_record() else {
        f.render_widget(Paragraph::new("No transaction selected").block(block), area);
        return;
    };

    let reasons = app.evaluation.reasons(record.id);

    let mut content = vec![
        Line::from(""),
        Line::from(vec![label("Row"), Span::raw(format!("#{}", record.id))]),
        Line::from(""),
        Line::from(vec![
            label("Date"),
            Span::raw(
                record
                    .timestamp
                    .map(|ts| ts.to_string())
                    .unwrap_or_else(|| "not available".to_string()),
            ),
        ]),
        Line::from(""),
        Line::from(vec![label("Account"), Span::raw(record.account_id.clone())]),
        Line::from(""),
        Line::from(vec![label("Merchant"), Span::raw(record.merchant.clone())]),
        Line::from(""),
        Line::from(vec![
            label("Amount"),
            Span::styled(
                format!("{:.2}", record.amount),
                Style::default().fg(if reasons.is_empty() { Color::Green } else { Color::Red }),
            ),
        ]),
        Line::from(""),
        Line::from(vec![label("Type"), Span::raw(record.transaction_type.clone())]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(Span::styled(
            "  FLAGGED BY",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )),
        Line::from(""),
    ];

    if reasons.is_empty() {
        content.push(Line::from(Span::styled(
            "  (not flagged)",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for kind in reasons {
        content.push(Line::from(vec![
            Span::raw("  • "),
            Span::styled(kind.name().to_string(), Style::default().fg(Color::Red)),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(Paragraph::new(content).block(block), area);
}

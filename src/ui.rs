use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use expense_ledger::{
    BudgetStatus, ChartData, Expense, ExpenseTracker, LedgerError, LedgerResult, Settings,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Expenses,
    Budget,
    Chart,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Expenses => Page::Budget,
            Page::Budget => Page::Chart,
            Page::Chart => Page::Expenses,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Expenses => Page::Chart,
            Page::Budget => Page::Expenses,
            Page::Chart => Page::Budget,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Expenses => "Expenses",
            Page::Budget => "Budget",
            Page::Chart => "Chart",
        }
    }
}

// ============================================================================
// INPUT FORMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    AddExpense,
    SetBudget,
}

#[derive(Debug, Clone)]
pub struct Form {
    pub kind: FormKind,
    pub labels: [&'static str; 3],
    pub values: [String; 3],
    pub focus: usize,
}

impl Form {
    pub fn add_expense() -> Self {
        Form {
            kind: FormKind::AddExpense,
            labels: ["Date (YYYY-MM-DD)", "Category", "Amount"],
            values: Default::default(),
            focus: 0,
        }
    }

    /// Pre-filled with the exact current budget; submitting unchanged is a no-op
    pub fn set_budget(current: Option<&expense_ledger::Budget>) -> Self {
        let values = match current {
            Some(b) => [
                b.max_amount.to_string(),
                b.start.format("%Y-%m-%d").to_string(),
                b.end.format("%Y-%m-%d").to_string(),
            ],
            None => Default::default(),
        };
        Form {
            kind: FormKind::SetBudget,
            labels: ["Maximum Budget", "Start Date (YYYY-MM-DD)", "End Date (YYYY-MM-DD)"],
            values,
            focus: 0,
        }
    }

    pub fn title(&self) -> &str {
        match self.kind {
            FormKind::AddExpense => " Add Expense ",
            FormKind::SetBudget => " Set Budget ",
        }
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.values.len();
    }

    fn previous_field(&mut self) {
        self.focus = (self.focus + self.values.len() - 1) % self.values.len();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub tracker: ExpenseTracker,
    pub settings: Settings,
    pub expenses: Vec<Expense>,
    pub total: f64,
    pub budget_status: Option<BudgetStatus>,
    pub chart: ChartData,
    pub state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub form: Option<Form>,
    pub status: Option<StatusMessage>,
}

impl App {
    pub fn new(tracker: ExpenseTracker, settings: Settings) -> LedgerResult<Self> {
        let mut app = Self {
            tracker,
            settings,
            expenses: Vec::new(),
            total: 0.0,
            budget_status: None,
            chart: ChartData::empty(chrono::Local::now().date_naive()),
            state: TableState::default(),
            current_page: Page::Expenses,
            show_detail: false,
            form: None,
            status: None,
        };
        app.refresh()?;
        if !app.expenses.is_empty() {
            app.state.select(Some(0));
        }
        Ok(app)
    }

    /// Reload list, total, budget status and chart after any mutation
    pub fn refresh(&mut self) -> LedgerResult<()> {
        let listing = self.tracker.list()?;
        self.expenses = listing.expenses;
        self.total = listing.total;
        self.budget_status = self.tracker.status()?;
        self.chart = self.tracker.chart()?;

        let len = self.expenses.len();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            _ => {}
        }
        Ok(())
    }

    pub fn selected_expense(&self) -> Option<&Expense> {
        self.state.selected().and_then(|i| self.expenses.get(i))
    }

    fn ok(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    fn fail(&mut self, err: &LedgerError) {
        self.status = Some(StatusMessage {
            text: err.user_message(),
            is_error: true,
        });
    }

    fn after_mutation(&mut self, message: &str) {
        match self.refresh() {
            Ok(()) => self.ok(message),
            Err(e) => self.fail(&e),
        }
    }

    pub fn delete_selected(&mut self) {
        let selected = self.selected_expense().map(|e| e.id);
        match self.tracker.delete_selected(selected) {
            Ok(()) => self.after_mutation("Expense deleted successfully!"),
            Err(e) => self.fail(&e),
        }
    }

    pub fn open_form(&mut self, form: Form) {
        self.form = Some(form);
    }

    /// Submit the open form. It stays open with its input on failure.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.clone() else {
            return;
        };
        let [a, b, c] = &form.values;

        let result = match form.kind {
            FormKind::AddExpense => self.tracker.add_expense(a, b, c).map(|_| "Expense added successfully!"),
            FormKind::SetBudget => self.tracker.set_budget(a, b, c).map(|_| "Budget updated"),
        };

        match result {
            Ok(message) => {
                self.form = None;
                self.after_mutation(message);
                if form.kind == FormKind::AddExpense && !self.expenses.is_empty() {
                    self.state.select(Some(self.expenses.len() - 1));
                }
            }
            Err(e) => self.fail(&e),
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn next(&mut self) {
        let len = self.expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.expenses.len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + 20).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.expenses.is_empty() {
            return;
        }
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(20));
        self.state.select(Some(i));
    }

    /// Returns true when the app should exit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.form.is_some() {
            match key.code {
                KeyCode::Esc => self.form = None,
                KeyCode::Enter => self.submit_form(),
                code => {
                    if let Some(form) = self.form.as_mut() {
                        match code {
                            KeyCode::Tab | KeyCode::Down => form.next_field(),
                            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
                            KeyCode::Backspace => {
                                form.values[form.focus].pop();
                            }
                            KeyCode::Char(c) => form.values[form.focus].push(c),
                            _ => {}
                        }
                    }
                }
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Enter => self.show_detail = !self.show_detail,
            KeyCode::Tab => self.next_page(),
            KeyCode::BackTab => self.previous_page(),
            KeyCode::Char('a') => self.open_form(Form::add_expense()),
            KeyCode::Char('b') => {
                let form = Form::set_budget(self.tracker.budget());
                self.open_form(form);
            }
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('r') => self.after_mutation("Refreshed"),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home if !self.expenses.is_empty() => self.state.select(Some(0)),
            KeyCode::End if !self.expenses.is_empty() => {
                self.state.select(Some(self.expenses.len() - 1))
            }
            _ => {}
        }
        false
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "TUI loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

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

    match app.current_page {
        Page::Expenses if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                .split(chunks[1]);

            render_table(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Expenses => render_table(f, chunks[1], app),
        Page::Budget => render_budget(f, chunks[1], app),
        Page::Chart => render_chart(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    let screen = f.size();
    if let Some(form) = &app.form {
        render_form(f, screen, form);
    }
}

fn budget_color(status: &BudgetStatus) -> Color {
    if status.is_over() {
        Color::Red
    } else {
        Color::Green
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Expenses, Page::Budget, Page::Chart];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
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

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total Expense: {}", app.settings.format_amount(app.total)),
        Style::default().fg(Color::White),
    ));

    if let Some(status) = &app.budget_status {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            status.message(),
            Style::default().fg(budget_color(status)),
        ));
    }

    let header = Paragraph::new(Line::from(tab_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["#", "Date", "Category", "Amount"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let in_budget = app.tracker.budget().cloned();
    let rows = app.expenses.iter().map(|expense| {
        let color = match &in_budget {
            Some(b) if b.contains(expense.date) => Color::White,
            Some(_) => Color::DarkGray,
            None => Color::White,
        };

        let cells = vec![
            Cell::from(expense.id.to_string()),
            Cell::from(expense.date_string()),
            Cell::from(truncate(&expense.category, 30)),
            Cell::from(app.settings.format_amount(expense.amount)),
        ];

        Row::new(cells).height(1).style(Style::default().fg(color))
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(32),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Expenses "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn label(text: &str) -> Span<'static> {
    Span::styled(
        text.to_string(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Expense Details ");

    let Some(expense) = app.selected_expense() else {
        f.render_widget(Paragraph::new("No expense selected").block(block), area);
        return;
    };

    let in_budget = match app.tracker.budget() {
        Some(b) if b.contains(expense.date) => "yes",
        Some(_) => "no",
        None => "no budget set",
    };

    let content = vec![
        Line::from(""),
        Line::from(vec![label("  Id: "), Span::raw(expense.id.to_string())]),
        Line::from(""),
        Line::from(vec![label("  Date: "), Span::raw(expense.date_string())]),
        Line::from(""),
        Line::from(vec![label("  Category: "), Span::raw(expense.category.clone())]),
        Line::from(""),
        Line::from(vec![
            label("  Amount: "),
            Span::raw(app.settings.format_amount(expense.amount)),
        ]),
        Line::from(""),
        Line::from(vec![label("  In budget range: "), Span::raw(in_budget)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_budget(f: &mut Frame, area: Rect, app: &App) {
    let mut content = vec![Line::from("")];

    match (app.tracker.budget(), &app.budget_status) {
        (Some(budget), Some(status)) => {
            content.push(Line::from(vec![Span::raw("  "), Span::raw(budget.describe())]));
            content.push(Line::from(""));
            content.push(Line::from(vec![
                label("  Spent in range: "),
                Span::raw(app.settings.format_amount(status.spent())),
            ]));
            content.push(Line::from(""));
            content.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    status.message(),
                    Style::default()
                        .fg(budget_color(status))
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
        }
        _ => {
            content.push(Line::from(vec![Span::styled(
                "  No budget set.",
                Style::default().fg(Color::DarkGray),
            )]));
        }
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![
        Span::styled("  Hint: ", Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC)),
        Span::styled("press ", Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)),
        Span::styled("b", Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC)),
        Span::styled(
            " to set the budget",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
    ]));

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Budget "),
    );

    f.render_widget(paragraph, area);
}

fn render_chart(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", app.chart.title));

    if app.chart.is_empty() {
        f.render_widget(Paragraph::new("  No expenses in range").block(block), area);
        return;
    }

    // Bar heights are whole cents; negative totals draw as empty bars
    let bars: Vec<Bar> = app
        .chart
        .bars
        .iter()
        .map(|b| {
            Bar::default()
                .label(Line::from(truncate(&b.category, 12)))
                .value((b.total.max(0.0) * 100.0).round() as u64)
                .text_value(format!("{:.2}", b.total))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(12)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));

    f.render_widget(chart, area);
}

fn render_form(f: &mut Frame, area: Rect, form: &Form) {
    let popup = centered_rect(60, 11, area);

    let mut lines = vec![Line::from("")];
    for (i, (field_label, value)) in form.labels.iter().zip(form.values.iter()).enumerate() {
        let focused = i == form.focus;
        let marker = if focused { "→ " } else { "  " };
        let value_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(vec![
            Span::raw(marker),
            label(&format!("{}: ", field_label)),
            Span::styled(format!("{}{}", value, if focused { "_" } else { "" }), value_style),
        ]));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "  Enter submit │ Tab next field │ Esc cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(form.title().to_string()),
    );

    f.render_widget(Clear, popup);
    f.render_widget(paragraph, popup);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.expenses.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(message) = &app.status {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            message.text.clone(),
            Style::default().fg(if message.is_error { Color::Red } else { Color::Green }),
        ));
    }

    for (key, action) in [("a", " Add"), ("d", " Delete"), ("b", " Budget"), ("Tab", " Page")] {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(action));
    }
    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

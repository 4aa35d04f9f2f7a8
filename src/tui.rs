use crate::form::{Form, FormKind};
use crate::format::{format_amount, format_currency, format_multiplier, format_number};
use crate::holding::{AssetCategory, Valued};
use crate::portfolio::Portfolio;
use crate::simulation::SLIDER_DEFAULT;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, Gauge, List, ListItem, Paragraph,
        Row, Table, Tabs, Wrap,
    },
    Frame, Terminal,
};
use std::collections::HashSet;
use std::io;
use std::str::FromStr;
use std::time::Duration;
use tui_big_text::{BigText, PixelSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    TabBar,
    TotalValue,
    Breakdown,
    Allocation,
    Simulation,
    Help,
}

impl Component {
    /// Returns all available components
    pub fn all() -> Vec<Component> {
        vec![
            Component::TabBar,
            Component::TotalValue,
            Component::Breakdown,
            Component::Allocation,
            Component::Simulation,
            Component::Help,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::TabBar => "tab_bar",
            Component::TotalValue => "total_value",
            Component::Breakdown => "breakdown",
            Component::Allocation => "allocation",
            Component::Simulation => "simulation",
            Component::Help => "help",
        }
    }

    /// Returns a description of what the component does
    pub fn description(&self) -> &'static str {
        match self {
            Component::TabBar => "Top navigation bar showing active tab",
            Component::TotalValue => "Total portfolio value display",
            Component::Breakdown => "Holdings and subtotal per asset category",
            Component::Allocation => "Category bar chart and percentages",
            Component::Simulation => "Bitcoin price slider while simulating",
            Component::Help => "Keyboard shortcuts",
        }
    }
}

impl FromStr for Component {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tab_bar" => Ok(Component::TabBar),
            "total_value" => Ok(Component::TotalValue),
            "breakdown" => Ok(Component::Breakdown),
            "allocation" => Ok(Component::Allocation),
            "simulation" => Ok(Component::Simulation),
            "help" => Ok(Component::Help),
            _ => Err(format!("Unknown component: '{s}'")),
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisabledComponents {
    disabled: HashSet<Component>,
}

impl DisabledComponents {
    pub fn new(disabled_list: &[String]) -> Self {
        let mut disabled = HashSet::new();

        for component_str in disabled_list {
            match Component::from_str(component_str) {
                Ok(component) => {
                    disabled.insert(component);
                }
                Err(err) => log::warn!("{err}"),
            }
        }

        DisabledComponents { disabled }
    }

    pub fn is_disabled(&self, component: Component) -> bool {
        self.disabled.contains(&component)
    }
}

fn category_color(category: AssetCategory) -> Color {
    match category {
        AssetCategory::Stocks => Color::Rgb(0xFF, 0x63, 0x84),
        AssetCategory::RealEstate => Color::Rgb(0x36, 0xA2, 0xEB),
        AssetCategory::Bitcoin => Color::Rgb(0xFF, 0xCE, 0x56),
        AssetCategory::Cash => Color::Rgb(0x4C, 0xAF, 0x50),
    }
}

const INACTIVE_COLOR: Color = Color::Rgb(0xB0, 0xB0, 0xB0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tab {
    Overview,
    Holdings,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppMode {
    Normal,
    ChooseCategory,
    Edit,
}

impl Tab {
    fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview & Allocation",
            Tab::Holdings => "Holdings",
        }
    }

    fn all() -> &'static [Tab] {
        &[Tab::Overview, Tab::Holdings]
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "overview" => Some(Tab::Overview),
            "holdings" => Some(Tab::Holdings),
            _ => None,
        }
    }
}

/// A row of the holdings table: which category and which entry in it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldingRef {
    pub category: AssetCategory,
    pub index: usize,
}

pub struct App {
    pub current_tab: Tab,
    pub portfolio: Portfolio,
    pub should_quit: bool,
    pub error_message: Option<String>,
    pub currency: String,
    pub mode: AppMode,
    pub selected_row: usize,
    pub form: Option<Form>,
    pub disabled_components: DisabledComponents,
}

impl App {
    pub fn new(portfolio: Portfolio, currency: String, disabled_components: DisabledComponents) -> App {
        App {
            current_tab: Tab::Overview,
            portfolio,
            should_quit: false,
            error_message: None,
            currency,
            mode: AppMode::Normal,
            selected_row: 0,
            form: None,
            disabled_components,
        }
    }

    pub fn next_tab(&mut self) {
        let tabs = Tab::all();
        let current_index = tabs
            .iter()
            .position(|&t| t == self.current_tab)
            .unwrap_or(0);
        self.current_tab = tabs[(current_index + 1) % tabs.len()];
    }

    pub fn previous_tab(&mut self) {
        let tabs = Tab::all();
        let current_index = tabs
            .iter()
            .position(|&t| t == self.current_tab)
            .unwrap_or(0);
        self.current_tab = tabs[(current_index + tabs.len() - 1) % tabs.len()];
    }

    /// Rows of the holdings table, in display order. Bitcoin and cash
    /// always have a row since they always exist, possibly at zero.
    pub fn rows(&self) -> Vec<HoldingRef> {
        let stocks = (0..self.portfolio.stocks.len()).map(|index| HoldingRef {
            category: AssetCategory::Stocks,
            index,
        });
        let real_estate = (0..self.portfolio.real_estate.len()).map(|index| HoldingRef {
            category: AssetCategory::RealEstate,
            index,
        });
        stocks
            .chain(real_estate)
            .chain([AssetCategory::Bitcoin, AssetCategory::Cash].map(|category| HoldingRef {
                category,
                index: 0,
            }))
            .collect()
    }

    pub fn selected(&self) -> Option<HoldingRef> {
        self.rows().get(self.selected_row).copied()
    }

    pub fn select_next(&mut self) {
        if self.selected_row < self.rows().len().saturating_sub(1) {
            self.selected_row += 1;
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected_row > 0 {
            self.selected_row -= 1;
        }
    }

    pub fn delete_selected(&mut self) {
        if let Some(row) = self.selected() {
            self.portfolio.delete(row.category, row.index);
            self.selected_row = self.selected_row.min(self.rows().len().saturating_sub(1));
        }
    }

    pub fn open_form(&mut self, form: Form) {
        self.form = Some(form);
        self.mode = AppMode::Edit;
    }

    pub fn open_price_form(&mut self) {
        if let Some(HoldingRef {
            category: AssetCategory::Stocks,
            index,
        }) = self.selected()
        {
            self.open_form(Form::update_price(index));
        }
    }

    /// Abandon the form; whatever was typed is dropped.
    pub fn cancel_form(&mut self) {
        self.form = None;
        self.mode = AppMode::Normal;
    }

    pub fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match form.submit() {
            Ok(Some(submission)) => {
                if let Err(e) = self.portfolio.submit(submission) {
                    log::warn!("rejected submission: {e}");
                    self.error_message = Some(e.to_string());
                }
                self.cancel_form();
            }
            // incomplete: nothing happens, keep editing
            Ok(None) => {}
            Err(e) => {
                log::warn!("rejected input: {e}");
                self.error_message = Some(e.to_string());
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        if self.error_message.is_some() {
            self.error_message = None;
            return;
        }

        match self.mode {
            AppMode::Normal => self.handle_normal_key(code),
            AppMode::ChooseCategory => {
                let category = match code {
                    KeyCode::Char('1') | KeyCode::Char('s') => Some(AssetCategory::Stocks),
                    KeyCode::Char('2') | KeyCode::Char('r') => Some(AssetCategory::RealEstate),
                    KeyCode::Char('3') | KeyCode::Char('b') => Some(AssetCategory::Bitcoin),
                    KeyCode::Char('4') | KeyCode::Char('c') => Some(AssetCategory::Cash),
                    _ => None,
                };
                match (category, code) {
                    (Some(category), _) => self.open_form(Form::add(category)),
                    (None, KeyCode::Esc) => self.mode = AppMode::Normal,
                    _ => {}
                }
            }
            AppMode::Edit => {
                let Some(form) = self.form.as_mut() else {
                    self.mode = AppMode::Normal;
                    return;
                };
                match code {
                    KeyCode::Esc => self.cancel_form(),
                    KeyCode::Enter => self.submit_form(),
                    KeyCode::Tab | KeyCode::Down => form.focus_next(),
                    KeyCode::BackTab | KeyCode::Up => form.focus_previous(),
                    KeyCode::Backspace => form.backspace(),
                    KeyCode::Char(c) => form.input(c),
                    _ => {}
                }
            }
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            // Vim navigation - hjkl
            KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
                self.previous_tab();
            }
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => {
                self.next_tab();
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if self.current_tab == Tab::Holdings {
                    self.select_next();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.current_tab == Tab::Holdings {
                    self.select_previous();
                }
            }
            KeyCode::Char('d') => {
                if self.current_tab == Tab::Holdings {
                    self.delete_selected();
                }
            }
            KeyCode::Char('p') => {
                if self.current_tab == Tab::Holdings {
                    self.open_price_form();
                }
            }
            KeyCode::Char('a') => self.mode = AppMode::ChooseCategory,
            KeyCode::Char('s') => self.portfolio.toggle_simulation(),
            KeyCode::Char('[') => self.portfolio.step_slider(-1),
            KeyCode::Char(']') => self.portfolio.step_slider(1),
            KeyCode::Char('{') => self.portfolio.step_slider(-10),
            KeyCode::Char('}') => self.portfolio.step_slider(10),
            KeyCode::Char('0') => self.portfolio.set_slider(SLIDER_DEFAULT),
            KeyCode::Char('1') => self.current_tab = Tab::Overview,
            KeyCode::Char('2') => self.current_tab = Tab::Holdings,
            _ => {}
        }
    }
}

pub fn run_tui(mut app: App, tab: Option<Tab>) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    if let Some(tab) = tab {
        app.current_tab = tab;
    }

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("terminal loop failed: {err}");
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = if app.disabled_components.is_disabled(Component::TabBar) {
        vec![f.area()]
    } else {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(f.area())
            .to_vec()
    };

    if !app.disabled_components.is_disabled(Component::TabBar) {
        let tab_titles: Vec<Line> = Tab::all()
            .iter()
            .map(|t| {
                let style = if *t == app.current_tab {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(Span::styled(t.title(), style))
            })
            .collect();

        let title = if app.portfolio.is_simulating() {
            "Portfolio Tracker [SIMULATION]"
        } else {
            "Portfolio Tracker"
        };
        let tabs = Tabs::new(tab_titles)
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(Style::default().fg(Color::White))
            .highlight_style(Style::default().fg(Color::Yellow))
            .select(
                Tab::all()
                    .iter()
                    .position(|&t| t == app.current_tab)
                    .unwrap_or(0),
            );

        f.render_widget(tabs, chunks[0]);
    }

    let content_area = chunks[chunks.len() - 1];

    match app.current_tab {
        Tab::Overview => render_overview(f, content_area, app),
        Tab::Holdings => render_holdings(f, content_area, app),
    }

    match app.mode {
        AppMode::ChooseCategory => render_category_picker(f),
        AppMode::Edit => {
            if let Some(form) = &app.form {
                render_form(f, form, app);
            }
        }
        AppMode::Normal => {}
    }

    if let Some(error) = &app.error_message {
        render_error_popup(f, error);
    }
}

fn render_total_value(f: &mut Frame, area: Rect, app: &App) {
    let total_value = app.portfolio.get_total_value();
    let big_text_value = format_currency(total_value, &app.currency);

    let big_text = BigText::builder()
        .pixel_size(PixelSize::Quadrant)
        .style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .lines(vec![big_text_value.clone().into()])
        .build();

    let title = if app.portfolio.is_simulating() {
        format!("Total Portfolio Value ({}) - simulated", app.currency)
    } else {
        format!("Total Portfolio Value ({})", app.currency)
    };
    let big_text_widget = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Center);

    f.render_widget(big_text_widget, area);

    // Center the big text within the widget
    let inner = area.inner(ratatui::layout::Margin {
        horizontal: 1,
        vertical: 1,
    });
    let big_text_width = big_text_value.chars().count() as u16 * 4; // Approximate width per character in big text
    let available_width = inner.width;

    let centered_area = if big_text_width < available_width {
        let margin = (available_width - big_text_width) / 2;
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(margin),
                Constraint::Min(0),
                Constraint::Length(margin),
            ])
            .split(inner)[1]
    } else {
        inner
    };

    f.render_widget(big_text, centered_area);
}

fn breakdown_lines(app: &App) -> Vec<ListItem<'static>> {
    let portfolio = &app.portfolio;
    let valuation = portfolio.valuation();
    let money = |v: f64| format_currency(v, &app.currency);
    let mut items = Vec::new();

    for &category in AssetCategory::all() {
        let value = valuation.get(category);
        let color = if value > 0.0 {
            category_color(category)
        } else {
            INACTIVE_COLOR
        };
        items.push(ListItem::new(Line::from(Span::styled(
            format!("{category} - {}", money(value)),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))));

        let details: Vec<String> = match category {
            AssetCategory::Stocks => portfolio
                .stocks
                .iter()
                .map(|stock| {
                    format!(
                        "{}: {} shares @ {} each = {}",
                        stock.name,
                        format_number(stock.quantity),
                        money(stock.price),
                        money(stock.value())
                    )
                })
                .collect(),
            AssetCategory::RealEstate => portfolio
                .real_estate
                .iter()
                .map(|property| format!("{}: {}", property.name, money(property.market_value)))
                .collect(),
            AssetCategory::Bitcoin => match &portfolio.simulation {
                Some(simulation) => vec![
                    format!(
                        "{} BTC @ {} each (simulated)",
                        format_number(simulation.amount),
                        money(simulation.price)
                    ),
                    format!("real price {}", money(portfolio.bitcoin.price)),
                ],
                None => vec![format!(
                    "{} BTC @ {} each",
                    format_number(portfolio.bitcoin.amount),
                    money(portfolio.bitcoin.price)
                )],
            },
            AssetCategory::Cash => vec![format!(
                "{} {} at {}% yield",
                format_number(portfolio.cash.amount),
                app.currency,
                format_number(portfolio.cash.yield_rate)
            )],
        };

        items.extend(details.into_iter().map(|line| {
            ListItem::new(Line::from(Span::styled(
                format!("  {line}"),
                Style::default().fg(Color::White),
            )))
        }));
    }

    items
}

fn render_breakdown(f: &mut Frame, area: Rect, app: &App) {
    let list = List::new(breakdown_lines(app))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Portfolio Breakdown"),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(list, area);
}

fn render_allocation(f: &mut Frame, area: Rect, app: &App) {
    let valuation = app.portfolio.valuation();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(6)])
        .split(area);

    let bars: Vec<Bar> = valuation
        .chart_slices()
        .into_iter()
        .map(|slice| {
            let color = if slice.active {
                category_color(slice.category)
            } else {
                INACTIVE_COLOR
            };
            Bar::default()
                .value(slice.value.max(0.0).round() as u64)
                .label(Line::from(slice.category.label()))
                .text_value(if slice.active {
                    format_number(slice.value)
                } else {
                    "-".to_string()
                })
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();

    let barchart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Asset Allocation"),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(11)
        .bar_gap(2);

    f.render_widget(barchart, chunks[0]);

    let detailed_list: Vec<ListItem> = valuation
        .allocation()
        .into_iter()
        .map(|(category, percentage)| {
            let color = if valuation.get(category) > 0.0 {
                category_color(category)
            } else {
                INACTIVE_COLOR
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<15}", category.label()), Style::default().fg(color)),
                Span::styled(format!("{percentage:>8.2}%"), Style::default().fg(color)),
            ]))
        })
        .collect();

    let list = List::new(detailed_list)
        .block(Block::default().borders(Borders::ALL).title("Allocation %"))
        .style(Style::default().fg(Color::White));

    f.render_widget(list, chunks[1]);
}

fn render_simulation(f: &mut Frame, area: Rect, app: &App) {
    let slider = app.portfolio.slider;
    let simulated = app.portfolio.bitcoin_value();
    let label = format!(
        "Slider {} | {} | {} | BTC {} -> {}",
        slider.get(),
        slider.regime(),
        format_multiplier(slider.multiplier()),
        format_currency(app.portfolio.bitcoin.value(), &app.currency),
        format_currency(simulated, &app.currency),
    );

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Bitcoin Simulation ([ ] step 1 | { } step 10 | 0 reset | s exit)"),
        )
        .gauge_style(Style::default().fg(category_color(AssetCategory::Bitcoin)))
        .ratio(slider.ratio())
        .label(label);

    f.render_widget(gauge, area);
}

fn render_overview(f: &mut Frame, area: Rect, app: &App) {
    let disabled = &app.disabled_components;
    let show_total = !disabled.is_disabled(Component::TotalValue);
    let show_simulation =
        app.portfolio.is_simulating() && !disabled.is_disabled(Component::Simulation);
    let show_breakdown = !disabled.is_disabled(Component::Breakdown);
    let show_allocation = !disabled.is_disabled(Component::Allocation);
    let show_help = !disabled.is_disabled(Component::Help);

    let mut constraints = Vec::new();
    if show_total {
        constraints.push(Constraint::Length(7));
    }
    if show_simulation {
        constraints.push(Constraint::Length(3));
    }
    if show_breakdown || show_allocation {
        constraints.push(Constraint::Min(0));
    }
    if show_help {
        constraints.push(Constraint::Length(3));
    }

    if constraints.is_empty() {
        let placeholder = Paragraph::new("All overview components are disabled")
            .block(Block::default().borders(Borders::ALL).title("Overview"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(placeholder, area);
        return;
    }

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    let mut chunk_index = 0;

    if show_total {
        render_total_value(f, main_chunks[chunk_index], app);
        chunk_index += 1;
    }

    if show_simulation {
        render_simulation(f, main_chunks[chunk_index], app);
        chunk_index += 1;
    }

    if show_breakdown || show_allocation {
        let section = main_chunks[chunk_index];
        match (show_breakdown, show_allocation) {
            (true, false) => render_breakdown(f, section, app),
            (false, true) => render_allocation(f, section, app),
            _ => {
                let halves = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .split(section);
                render_breakdown(f, halves[0], app);
                render_allocation(f, halves[1], app);
            }
        }
        chunk_index += 1;
    }

    if show_help {
        let help_text = Paragraph::new(
            "a (add) | s (simulate) | [ ] { } (slider) | 0 (reset) | h/l (tabs) | 1-2 (direct) | q (quit)",
        )
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);

        f.render_widget(help_text, main_chunks[chunk_index]);
    }
}

fn render_holdings(f: &mut Frame, area: Rect, app: &App) {
    let portfolio = &app.portfolio;
    let money = |v: f64| format_currency(v, &app.currency);

    let header_cells = ["Name", "Class", "Amount", "Price", "Value"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = app.rows().into_iter().enumerate().map(|(i, row)| {
        let cells: [String; 4] = match row.category {
            AssetCategory::Stocks => {
                let stock = &portfolio.stocks[row.index];
                [
                    stock.name.clone(),
                    format_amount(stock.quantity),
                    money(stock.price),
                    money(stock.value()),
                ]
            }
            AssetCategory::RealEstate => {
                let property = &portfolio.real_estate[row.index];
                [
                    property.name.clone(),
                    "-".to_string(),
                    "-".to_string(),
                    money(property.value()),
                ]
            }
            AssetCategory::Bitcoin => match &portfolio.simulation {
                Some(simulation) => [
                    "BTC (simulated)".to_string(),
                    format_amount(simulation.amount),
                    money(simulation.price),
                    money(simulation.value()),
                ],
                None => [
                    "BTC".to_string(),
                    format_amount(portfolio.bitcoin.amount),
                    money(portfolio.bitcoin.price),
                    money(portfolio.bitcoin.value()),
                ],
            },
            AssetCategory::Cash => [
                portfolio.cash_label(),
                format_amount(portfolio.cash.amount),
                "-".to_string(),
                money(portfolio.cash.value()),
            ],
        };

        let row_style = if i == app.selected_row {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        let [name, amount, price, value] = cells;
        Row::new(vec![
            Cell::from(name),
            Cell::from(row.category.label())
                .style(Style::default().fg(category_color(row.category))),
            Cell::from(amount),
            Cell::from(price),
            Cell::from(value),
        ])
        .height(1)
        .style(row_style)
    });

    let total_row = Row::new(vec![
        Cell::from("TOTAL").style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Cell::from(""),
        Cell::from(""),
        Cell::from(""),
        Cell::from(money(portfolio.get_total_value())).style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
    ])
    .height(1);

    let table_title = "Holdings - j/k (select) | a (add) | d (delete) | p (update price) | s (simulate)";
    let constraints = [
        Constraint::Percentage(30),
        Constraint::Percentage(15),
        Constraint::Percentage(15),
        Constraint::Percentage(20),
        Constraint::Percentage(20),
    ];

    let table = Table::new(rows.chain(std::iter::once(total_row)), constraints)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(table_title))
        .style(Style::default().fg(Color::White));

    f.render_widget(table, area);
}

fn render_category_picker(f: &mut Frame) {
    let popup_area = centered_rect(40, 40, f.area());
    f.render_widget(Clear, popup_area);

    let items: Vec<ListItem> = AssetCategory::all()
        .iter()
        .enumerate()
        .map(|(i, &category)| {
            ListItem::new(Line::from(Span::styled(
                format!("{} {}", i + 1, category.label()),
                Style::default().fg(category_color(category)),
            )))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Add Holding (1-4, Esc to cancel) ")
            .style(Style::default().bg(Color::Black)),
    );

    f.render_widget(list, popup_area);
}

fn render_form(f: &mut Frame, form: &Form, app: &App) {
    let popup_area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, popup_area);

    let main_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", form.title()))
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));
    f.render_widget(main_block, popup_area);

    let mut constraints: Vec<Constraint> = Vec::new();
    if let FormKind::UpdatePrice { .. } = form.kind() {
        constraints.push(Constraint::Length(2));
    }
    constraints.extend(form.fields().iter().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(2));

    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(popup_area);

    let mut chunk_index = 0;

    if let FormKind::UpdatePrice { index } = form.kind() {
        if let Some(stock) = app.portfolio.stocks.get(index) {
            let current = Paragraph::new(format!(
                "{}: current price {}",
                stock.name,
                format_currency(stock.price, &app.currency)
            ))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
            f.render_widget(current, popup_layout[chunk_index]);
        }
        chunk_index += 1;
    }

    for (i, field) in form.fields().iter().enumerate() {
        let focused = i == form.focus();
        let border_color = if focused { Color::Yellow } else { Color::Gray };
        let marker = if field.is_required() { "*" } else { "" };
        let cursor = if focused { "▌" } else { "" };
        let input_field = Paragraph::new(format!("{}{cursor}", field.value))
            .style(Style::default().fg(Color::White))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border_color))
                    .title(format!(" {}{marker} ", field.label)),
            );
        f.render_widget(input_field, popup_layout[chunk_index]);
        chunk_index += 1;
    }

    let hint = if form.is_complete() {
        Span::styled("Ready to submit", Style::default().fg(Color::Green))
    } else {
        Span::styled(
            "Fill in all fields marked *",
            Style::default().fg(Color::Yellow),
        )
    };
    f.render_widget(
        Paragraph::new(Line::from(hint)).alignment(Alignment::Center),
        popup_layout[chunk_index],
    );
    chunk_index += 1;

    let instructions = "Enter: Submit | Esc: Cancel | Tab: Next field";
    let instructions_paragraph = Paragraph::new(instructions)
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);
    f.render_widget(instructions_paragraph, popup_layout[chunk_index]);
}

fn render_error_popup(f: &mut Frame, error: &str) {
    let popup_area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, popup_area);

    let error_paragraph = Paragraph::new(error)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Error (any key to dismiss)")
                .style(Style::default().fg(Color::Red)),
        )
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(error_paragraph, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holding::{BitcoinPosition, StockHolding};
    use ratatui::backend::TestBackend;

    fn app() -> App {
        App::new(Portfolio::new(), "USD".to_string(), DisabledComponents::default())
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_component_from_str() {
        for component in Component::all() {
            assert_eq!(Component::from_str(component.as_str()), Ok(component));
            assert!(!component.description().is_empty());
        }
        assert!(Component::from_str("bogus").is_err());
    }

    #[test]
    fn test_disabled_components() {
        let disabled = DisabledComponents::new(&["help".to_string(), "nope".to_string()]);
        assert!(disabled.is_disabled(Component::Help));
        assert!(!disabled.is_disabled(Component::TabBar));
    }

    #[test]
    fn test_tab_navigation() {
        let mut app = app();
        app.handle_key(KeyCode::Char('l'));
        assert_eq!(app.current_tab, Tab::Holdings);
        app.handle_key(KeyCode::Char('l'));
        assert_eq!(app.current_tab, Tab::Overview);
        app.handle_key(KeyCode::Char('2'));
        assert_eq!(app.current_tab, Tab::Holdings);
        assert_eq!(Tab::from_str("OVERVIEW"), Some(Tab::Overview));
    }

    #[test]
    fn test_add_stock_through_form() {
        let mut app = app();
        app.handle_key(KeyCode::Char('a'));
        assert_eq!(app.mode, AppMode::ChooseCategory);
        app.handle_key(KeyCode::Char('1'));
        assert_eq!(app.mode, AppMode::Edit);

        type_str(&mut app, "AAPL");
        app.handle_key(KeyCode::Tab);
        type_str(&mut app, "10");
        app.handle_key(KeyCode::Tab);
        type_str(&mut app, "150");
        app.handle_key(KeyCode::Enter);

        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.portfolio.stocks, vec![StockHolding::new("AAPL", 10.0, 150.0)]);
    }

    #[test]
    fn test_incomplete_form_stays_open() {
        let mut app = app();
        app.handle_key(KeyCode::Char('a'));
        app.handle_key(KeyCode::Char('s'));
        type_str(&mut app, "AAPL");
        app.handle_key(KeyCode::Tab);
        type_str(&mut app, "10");
        app.handle_key(KeyCode::Enter);

        assert_eq!(app.mode, AppMode::Edit);
        assert!(app.error_message.is_none());
        assert!(app.portfolio.stocks.is_empty());

        app.handle_key(KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.form.is_none());
    }

    #[test]
    fn test_invalid_input_shows_error() {
        let mut app = app();
        app.handle_key(KeyCode::Char('a'));
        app.handle_key(KeyCode::Char('b'));
        type_str(&mut app, "1..");
        app.handle_key(KeyCode::Tab);
        type_str(&mut app, "100");
        app.handle_key(KeyCode::Enter);

        assert!(app.error_message.is_some());
        assert_eq!(app.portfolio.bitcoin, BitcoinPosition::default());

        // first key only dismisses the popup
        app.handle_key(KeyCode::Esc);
        assert!(app.error_message.is_none());
        assert_eq!(app.mode, AppMode::Edit);
    }

    #[test]
    fn test_delete_and_update_price_from_holdings() {
        let mut portfolio = Portfolio::new();
        portfolio.add_stock(StockHolding::new("A", 1.0, 1.0));
        portfolio.add_stock(StockHolding::new("B", 1.0, 2.0));
        let mut app = App::new(portfolio, "USD".to_string(), DisabledComponents::default());
        app.current_tab = Tab::Holdings;

        app.handle_key(KeyCode::Char('j'));
        app.handle_key(KeyCode::Char('p'));
        assert_eq!(app.mode, AppMode::Edit);
        type_str(&mut app, "7.5");
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.portfolio.stocks[1].price, 7.5);

        app.handle_key(KeyCode::Char('k'));
        app.handle_key(KeyCode::Char('d'));
        let names: Vec<&str> = app.portfolio.stocks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["B"]);
    }

    #[test]
    fn test_price_form_only_for_stocks() {
        let mut app = app();
        app.current_tab = Tab::Holdings;
        assert_eq!(app.selected().map(|r| r.category), Some(AssetCategory::Bitcoin));
        app.handle_key(KeyCode::Char('p'));
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn test_simulation_keys() {
        let mut app = app();
        app.portfolio.set_bitcoin(BitcoinPosition::new(2.0, 50_000.0));
        app.handle_key(KeyCode::Char('s'));
        assert!(app.portfolio.is_simulating());
        app.handle_key(KeyCode::Char(']'));
        assert_eq!(app.portfolio.slider.get(), 201);
        assert!((app.portfolio.valuation().bitcoin - 200_000.0).abs() < 1e-6);
        app.handle_key(KeyCode::Char('{'));
        assert_eq!(app.portfolio.slider.get(), 191);
        app.handle_key(KeyCode::Char('}'));
        assert_eq!(app.portfolio.slider.get(), 201);
        app.handle_key(KeyCode::Char('0'));
        assert_eq!(app.portfolio.slider.get(), SLIDER_DEFAULT);
        assert!((app.portfolio.valuation().bitcoin - 100_000.0).abs() < 1e-6);
        app.handle_key(KeyCode::Char('s'));
        assert!(!app.portfolio.is_simulating());
    }

    #[test]
    fn test_render_overview() {
        let mut app = app();
        app.portfolio.set_bitcoin(BitcoinPosition::new(2.0, 50_000.0));
        app.portfolio.toggle_simulation();
        let screen = render(&app);
        assert!(screen.contains("Total Portfolio Value"));
        assert!(screen.contains("Portfolio Breakdown"));
        assert!(screen.contains("Bitcoin Simulation"));
        assert!(screen.contains("Stocks - $0"));
        assert!(screen.contains("0 (reset)"));
    }

    #[test]
    fn test_render_holdings_and_form() {
        let mut app = app();
        app.portfolio.add_stock(StockHolding::new("MSFT", 3.0, 400.0));
        app.current_tab = Tab::Holdings;
        app.open_form(Form::add(AssetCategory::Cash));
        let screen = render(&app);
        assert!(screen.contains("MSFT"));
        assert!(screen.contains("Add Cash"));
    }
}

use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use blockshift_engine::{
    BlockLayout, DocumentView, DragConfig, DragGestureController, DragState, DragSurface,
    DropOutcome, FrameTicket, GestureOutcome, MemoryEditor, Point, PointerId, PointerTarget, Rect,
    block_to_markdown, parse_markdown, to_markdown,
};
use crossterm::event::{Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect as Area},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

/// Terminal cells are laid out on a pixel grid so the engine's thresholds and
/// geometry apply unchanged
pub const CELL_WIDTH: f64 = 8.0;
pub const CELL_HEIGHT: f64 = 16.0;

/// Columns to the left of each block: the insert action and the grip
const GUTTER_CELLS: u16 = 3;
const MOUSE_POINTER: PointerId = 1;
const SCROLL_STEP: f64 = 3.0 * CELL_HEIGHT;

pub struct App {
    path: PathBuf,
    controller: DragGestureController<MemoryEditor>,
    pending_frame: Option<FrameTicket>,
    dragging: Rc<Cell<bool>>,
    saved_version: u64,
    status: String,
}

impl App {
    pub fn new(path: PathBuf, source: &str, config: DragConfig) -> Self {
        let editor = MemoryEditor::new(parse_markdown(source))
            .with_line_height(CELL_HEIGHT)
            .with_block_gap(CELL_HEIGHT)
            .with_gutter_width(f64::from(GUTTER_CELLS) * CELL_WIDTH)
            .with_selected_class(config.selected_class.clone());
        let mut controller = DragGestureController::new(editor, config);

        let dragging = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dragging);
        controller.activity_mut().subscribe(move |active| flag.set(active));

        Self {
            path,
            controller,
            pending_frame: None,
            dragging,
            saved_version: 0,
            status: "Drag a block by its ⠿ grip".to_string(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.controller.host().document().version() != self.saved_version
    }

    /// Size the drag surface to the content area of the terminal
    pub fn set_viewport(&mut self, area: Area) {
        self.controller.host_mut().set_surface(area_to_rect(area));
    }

    /// Run work deferred to the frame after a drag started
    pub fn after_draw(&mut self) {
        if let Some(ticket) = self.pending_frame.take()
            && !self.controller.on_frame(&ticket)
        {
            log::debug!("drag ended before its first frame");
        }
    }

    /// Returns true when the app should quit
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('s') => self.save(),
                KeyCode::Esc => {
                    if let Some(pointer_id) = self.controller.active_pointer() {
                        let outcome = self.controller.pointer_cancel(pointer_id);
                        self.report(outcome);
                    }
                }
                KeyCode::Down | KeyCode::Char('j') => self.scroll(SCROLL_STEP),
                KeyCode::Up | KeyCode::Char('k') => self.scroll(-SCROLL_STEP),
                _ => {}
            },
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::FocusLost => {
                if let Some(pointer_id) = self.controller.active_pointer() {
                    let outcome = self.controller.lost_pointer_capture(pointer_id);
                    self.report(outcome);
                }
            }
            _ => {}
        }
        false
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let point = cell_center(mouse.column, mouse.row);
        let outcome = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let target = self.hit_test(point);
                self.controller.pointer_down(MOUSE_POINTER, point, target)
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.controller.pointer_move(MOUSE_POINTER, point)
            }
            MouseEventKind::Up(MouseButton::Left) => self.controller.pointer_up(MOUSE_POINTER, point),
            MouseEventKind::ScrollDown => {
                self.scroll(SCROLL_STEP);
                return;
            }
            MouseEventKind::ScrollUp => {
                self.scroll(-SCROLL_STEP);
                return;
            }
            _ => return,
        };
        self.report(outcome);
    }

    fn hit_test(&self, point: Point) -> PointerTarget {
        let host = self.controller.host();
        for index in 0..host.block_count() {
            if let Some(grip) = host.grip_rect(index)
                && grip.contains(point)
            {
                // first gutter column holds the insert action
                return if point.x < grip.left() + CELL_WIDTH {
                    PointerTarget::GripAction
                } else {
                    PointerTarget::Grip { rect: grip }
                };
            }
        }
        if host
            .block_elements()
            .iter()
            .any(|element| element.rect.contains(point))
        {
            PointerTarget::Content
        } else {
            PointerTarget::Outside
        }
    }

    fn scroll(&mut self, delta: f64) {
        self.controller.host_mut().scroll_by(delta);
    }

    fn save(&mut self) {
        match self.write_file() {
            Ok(()) => {
                self.saved_version = self.controller.host().document().version();
                self.status = format!("Saved {}", self.path.display());
                log::info!("saved {}", self.path.display());
            }
            Err(err) => {
                self.status = format!("Save failed: {err:#}");
                log::error!("save failed: {err:#}");
            }
        }
    }

    fn write_file(&self) -> Result<()> {
        let markdown = to_markdown(self.controller.host().document());
        fs::write(&self.path, markdown)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    fn report(&mut self, outcome: GestureOutcome) {
        log::debug!("gesture outcome: {outcome:?}");
        match outcome {
            GestureOutcome::DragStarted { frame } => {
                self.pending_frame = Some(frame);
                self.status = "Release to drop, Esc to cancel".to_string();
            }
            GestureOutcome::Dropped(DropOutcome::Moved(moved)) => {
                self.status = format!("Moved block from {} to {}", moved.from, moved.to);
            }
            GestureOutcome::Dropped(DropOutcome::Failed(err)) => {
                self.status = format!("Move failed: {err}");
            }
            GestureOutcome::Dropped(DropOutcome::NoTarget | DropOutcome::SelfDrop) => {
                self.status = "Dropped in place".to_string();
            }
            GestureOutcome::Cancelled(reason) => {
                self.status = format!("Drag cancelled ({reason:?})");
            }
            _ => {}
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());
        let main = chunks[0];

        let title = format!(
            " {}{} ",
            self.path.display(),
            if self.is_dirty() { " [+]" } else { "" }
        );
        let border_style = if self.dragging.get() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let frame_block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title);
        let inner = frame_block.inner(main);
        f.render_widget(frame_block, main);

        self.set_viewport(inner);
        self.draw_blocks(f, inner);
        self.draw_indicator(f, main);
        self.draw_preview(f, inner);

        let help = Line::from(vec![
            Span::raw("q: Quit | s: Save | Esc: Cancel drag | wheel/↑↓: Scroll | "),
            Span::styled(self.status.clone(), Style::default().fg(Color::Cyan)),
        ]);
        f.render_widget(Paragraph::new(help), chunks[1]);
    }

    fn draw_blocks(&self, f: &mut Frame, inner: Area) {
        let host = self.controller.host();
        let document = host.document();
        let text_x = inner.x + GUTTER_CELLS;
        let text_width = inner.width.saturating_sub(GUTTER_CELLS);

        for element in host.block_elements() {
            let Some(block) = host.block(element.index) else {
                continue;
            };
            let selected =
                host.selection().is_some() && host.selection() == document.block_start(element.index);
            let style = if selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };

            let first_row = (element.rect.top() / CELL_HEIGHT).floor() as i64;
            for (offset, text) in block_to_markdown(block).lines().enumerate() {
                let Some(row) = row_within(inner, first_row + offset as i64) else {
                    continue;
                };
                if offset == 0 && inner.width >= GUTTER_CELLS {
                    let grip = Line::from(vec![
                        Span::styled("+", Style::default().fg(Color::Green)),
                        Span::styled("⠿", Style::default().fg(Color::DarkGray)),
                    ]);
                    f.render_widget(Paragraph::new(grip), Area::new(inner.x, row, 2, 1));
                }
                f.render_widget(
                    Paragraph::new(Line::styled(text.to_string(), style)),
                    Area::new(text_x, row, text_width, 1),
                );
            }
        }
    }

    /// The insertion line sits in the gap above or below the target block;
    /// above the first block it overlays the frame border
    fn draw_indicator(&self, f: &mut Frame, bounds: Area) {
        let host = self.controller.host();
        let (Some(placement), Some(target)) = (
            host.indicator(),
            self.controller.drag_state().and_then(DragState::target),
        ) else {
            return;
        };

        let edge = if target.insert_before {
            target.rect.top() - CELL_HEIGHT
        } else {
            target.rect.bottom()
        };
        let Some(row) = row_within(bounds, (edge / CELL_HEIGHT).floor() as i64) else {
            return;
        };
        let surface = host.surface_rect();
        let left = placement.left + surface.left() - host.scroll_offset().x;
        let col = ((left / CELL_WIDTH).floor().max(0.0) as u16).saturating_sub(GUTTER_CELLS);
        let width = ((placement.width / CELL_WIDTH) as u16 + GUTTER_CELLS)
            .min(bounds.right().saturating_sub(col));

        f.render_widget(
            Paragraph::new("─".repeat(usize::from(width))).style(Style::default().fg(Color::Cyan)),
            Area::new(col, row, width, 1),
        );
    }

    fn draw_preview(&self, f: &mut Frame, inner: Area) {
        let Some(preview) = self.controller.host().previews().first() else {
            return;
        };

        let col = (preview.top_left.x / CELL_WIDTH).floor().max(0.0) as u16;
        let row = (preview.top_left.y / CELL_HEIGHT).floor().max(0.0) as u16;
        let width = (preview.clone.rect.width / CELL_WIDTH).ceil() as u16;
        let height = (preview.clone.rect.height / CELL_HEIGHT).ceil() as u16 + 2;
        let area = Area::new(col, row, width, height).intersection(inner);
        if area.is_empty() {
            return;
        }

        let mut style = Style::default().fg(Color::Gray);
        if preview.style.opacity < 1.0 {
            style = style.add_modifier(Modifier::DIM);
        }
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(preview.clone.label.clone())
                .style(style)
                .block(Block::default().borders(Borders::ALL).border_style(style)),
            area,
        );
    }
}

/// Centre of a terminal cell on the pixel grid
fn cell_center(column: u16, row: u16) -> Point {
    Point::new(
        (f64::from(column) + 0.5) * CELL_WIDTH,
        (f64::from(row) + 0.5) * CELL_HEIGHT,
    )
}

fn area_to_rect(area: Area) -> Rect {
    Rect::new(
        f64::from(area.x) * CELL_WIDTH,
        f64::from(area.y) * CELL_HEIGHT,
        f64::from(area.width) * CELL_WIDTH,
        f64::from(area.height) * CELL_HEIGHT,
    )
}

fn row_within(area: Area, row: i64) -> Option<u16> {
    (row >= i64::from(area.top()) && row < i64::from(area.bottom())).then_some(row as u16)
}

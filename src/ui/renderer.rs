/// Terminal view of a running session.
///
/// Each frame the snapshot is turned into a glyph grid (one maze tile per
/// two terminal columns) plus a status line, written into a cell buffer and
/// diffed against the previous frame; only changed cells reach the terminal.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::ai::PursuerState;
use crate::domain::maze::MazeGrid;
use crate::domain::tile::{Collectible, TileKind};
use crate::sim::world::{Phase, Snapshot, WorldState};

const FLOOR_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: FLOOR_BG };

    /// Never produced by composition; forces a repaint of every cell.
    const STALE: Cell = Cell { ch: '\0', fg: Color::Reset, bg: Color::Reset };
}

/// Row-major cell grid sized to the terminal.
struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(width: usize, height: usize) -> Self {
        FrameBuffer { width, height, cells: vec![Cell::BLANK; width * height] }
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    fn set(&mut self, x: usize, y: usize, ch: char, fg: Color, bg: Color) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = Cell { ch, fg, bg };
        }
    }

    fn text(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, ch, fg, bg);
        }
    }
}

// ── Glyphs ──

/// Character grid for the snapshot: static tiles first, then collectibles,
/// then pursuers, then the player on top.
pub fn glyph_grid(maze: &MazeGrid, snap: &Snapshot) -> Vec<Vec<char>> {
    let mut grid: Vec<Vec<char>> = (0..maze.rows() as i32)
        .map(|r| {
            (0..maze.cols() as i32)
                .map(|c| match maze.tile_at(r, c) {
                    TileKind::Wall => '#',
                    TileKind::Shield => '=',
                    _ => ' ',
                })
                .collect()
        })
        .collect();

    let mut put = |row: i32, col: i32, ch: char| {
        if row >= 0 && col >= 0 {
            if let Some(cell) = grid.get_mut(row as usize).and_then(|r| r.get_mut(col as usize)) {
                *cell = ch;
            }
        }
    };

    for (tile, kind) in &snap.collectibles {
        put(tile.row, tile.col, match kind {
            Collectible::Pellet => '.',
            Collectible::Bonus => '*',
        });
    }
    for p in &snap.pursuers {
        let ch = match p.state {
            PursuerState::Frightened => 'g',
            PursuerState::Captured | PursuerState::Returning => '"',
            _ => 'G',
        };
        put(p.agent.tile.row, p.agent.tile.col, ch);
    }
    if snap.player_alive {
        put(snap.player.tile.row, snap.player.tile.col, '@');
    }
    grid
}

fn glyph_color(ch: char) -> Color {
    match ch {
        '#' => Color::Rgb { r: 40, g: 60, b: 200 },
        '=' => Color::Rgb { r: 255, g: 160, b: 200 },
        '.' => Color::Rgb { r: 230, g: 230, b: 180 },
        '*' => Color::Rgb { r: 255, g: 220, b: 50 },
        'G' => Color::Rgb { r: 255, g: 60, b: 60 },
        'g' => Color::Rgb { r: 80, g: 80, b: 255 },
        '"' => Color::White,
        '@' => Color::Rgb { r: 255, g: 255, b: 0 },
        _ => Color::White,
    }
}

// ── Renderer ──

/// Each maze tile is two terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    last_phase: Option<Phase>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            last_phase: None,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode + alternate screen. Returns whether the terminal
    /// reports key Release events.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(self.writer, terminal::EnterAlternateScreen, cursor::Hide)?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        self.repaint_all()?;
        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let resized = tw as usize != self.front.width || th as usize != self.front.height;
        if resized || self.last_phase != Some(world.phase) {
            self.repaint_all()?;
            self.last_phase = Some(world.phase);
        }

        self.front.cells.fill(Cell::BLANK);
        let snap = world.snapshot();
        self.compose(world, &snap);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Resize both buffers to the terminal and mark every cell stale.
    fn repaint_all(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.front = FrameBuffer::new(tw as usize, th as usize);
        self.back = FrameBuffer::new(tw as usize, th as usize);
        self.back.cells.fill(Cell::STALE);
        queue!(self.writer, SetBackgroundColor(FLOOR_BG), Clear(ClearType::All))
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let width = self.front.width;
        let mut colors: Option<(Color, Color)> = None;
        let mut cursor_at: Option<usize> = None;

        for (i, (cell, old)) in self.front.cells.iter().zip(&self.back.cells).enumerate() {
            if cell == old {
                continue;
            }
            if cursor_at != Some(i) {
                queue!(self.writer, MoveTo((i % width) as u16, (i / width) as u16))?;
            }
            if colors != Some((cell.fg, cell.bg)) {
                queue!(self.writer, SetForegroundColor(cell.fg), SetBackgroundColor(cell.bg))?;
                colors = Some((cell.fg, cell.bg));
            }
            queue!(self.writer, Print(cell.ch))?;
            // Cursor position after the last column is terminal-dependent
            cursor_at = ((i + 1) % width != 0).then_some(i + 1);
        }

        self.writer.flush()
    }

    fn compose(&mut self, w: &WorldState, snap: &Snapshot) {
        let hud_bg = Color::Rgb { r: 20, g: 20, b: 60 };
        let status = match snap.phase {
            Phase::Playing if snap.shields_present => "GET READY",
            Phase::Playing => "",
            Phase::Dying => "CAUGHT!",
            Phase::GameOver => "GAME OVER",
        };
        let hud = format!(
            " {}  Level:{:<2}  Score:{:<7}  Lives:{}  Bonus:{}  {} ",
            w.level_name, snap.level, snap.score, snap.lives, snap.bonus_items, status,
        );
        let hud_width = self.front.width;
        self.front.text(0, HUD_ROW, &" ".repeat(hud_width), Color::White, hud_bg);
        self.front.text(0, HUD_ROW, &hud, Color::White, hud_bg);

        let grid = glyph_grid(&w.maze, snap);
        for (r, line) in grid.iter().enumerate() {
            for (c, &ch) in line.iter().enumerate() {
                let (x, y) = (c * CELL_W, MAP_ROW + r);
                let fg = glyph_color(ch);
                if ch == '#' {
                    let bg = Color::Rgb { r: 20, g: 30, b: 110 };
                    self.front.text(x, y, "##", fg, bg);
                } else {
                    self.front.set(x, y, ch, fg, FLOOR_BG);
                }
            }
        }

        let help = " Arrows/WASD: Move   Q/Esc: Quit";
        self.front.text(0, MAP_ROW + grid.len() + 1, help, Color::DarkGrey, FLOOR_BG);
    }
}

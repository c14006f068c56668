use crate::interpreter::{DISPLAY_CELLS, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crossterm::{cursor, execute, terminal};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display is used by the environment to put the machine's framebuffer on a
/// screen. It should abstract the implementation details, so a variety of
/// kinds of screen would work.
pub trait Display {
    /// draw a whole frame: 64x32 cells, row-major, row 0 at the top
    fn draw(&mut self, framebuffer: &[bool]) -> Result<(), io::Error>;
}

// store useful metadata about the terminal: chip-8 width, height, and how many
// terminal cells each chip-8 pixel covers
struct Resolution(usize, usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    fn cell_width(&self) -> usize {
        self.0 * self.2
    }

    fn cell_height(&self) -> usize {
        self.1 * self.2
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.cell_width() - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.cell_height() - 1) as f64, 0.0]
    }

    /// every terminal cell covered by a pixel in the given state, as canvas
    /// coords. each pixel expands into a scale x scale block
    fn points_from_framebuffer<'a>(
        &self,
        framebuffer: &'a [bool],
        lit: bool,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let (w, scale) = (self.0, self.2);
        framebuffer
            .iter()
            .enumerate()
            .filter(move |(_, px)| **px == lit)
            .flat_map(move |(i, _)| {
                let (x, y) = (i % w, i / w);
                (0..scale * scale).map(move |s| {
                    (
                        (x * scale + s % scale) as f64,        // x
                        -1.0 * (y * scale + s / scale) as f64, // y
                    )
                })
            })
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
    foreground: Color,
    background: Color,
}

impl MonoTermDisplay {
    pub fn new(
        scale: u16,
        foreground: Color,
        background: Color,
    ) -> Result<MonoTermDisplay, io::Error> {
        let mut stdout = io::stdout();
        execute!(stdout, terminal::Clear(terminal::ClearType::All), cursor::Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(DISPLAY_WIDTH, DISPLAY_HEIGHT, scale.max(1) as usize),
            foreground,
            background,
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show);
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, framebuffer: &[bool]) -> Result<(), io::Error> {
        // make sure we're given exactly the right amount of data to draw
        assert_eq!(
            framebuffer.len(),
            self.resolution.pixel_count(),
            "MonoTermDisplay must have correct-sized data to draw"
        );

        // one canvas point per terminal cell, inside a one-cell border
        let resolution = &self.resolution;
        let (fg, bg) = (self.foreground, self.background);
        self.terminal.draw(|f| {
            // clipped to the terminal, which may be smaller than the canvas
            let size = f.size().intersection(Rect::new(
                0,
                0,
                2 + resolution.cell_width() as u16,
                2 + resolution.cell_height() as u16,
            ));

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(bg)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &resolution
                            .points_from_framebuffer(framebuffer, false)
                            .collect::<Vec<_>>(),
                        color: bg,
                    });
                    ctx.draw(&Points {
                        coords: &resolution
                            .points_from_framebuffer(framebuffer, true)
                            .collect::<Vec<_>>(),
                        color: fg,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines; remembers the last frame
pub struct DummyDisplay {
    pub frames: usize,
    pub last: Vec<bool>,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay {
            frames: 0,
            last: vec![false; DISPLAY_CELLS],
        }
    }
}

impl Default for DummyDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, framebuffer: &[bool]) -> Result<(), io::Error> {
        self.frames += 1;
        self.last.clear();
        self.last.extend_from_slice(framebuffer);
        Ok(())
    }
}

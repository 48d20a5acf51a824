use anyhow::Result;
use crossterm::{
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::fmt;
use std::io::{stdout, Write};

use crate::{
    bitboard::{BitBoard, Player},
    HEIGHT, WIDTH,
};

/// Draws the board with coloured tiles, top row first
pub fn draw<W: Write>(out: &mut W, board: &BitBoard) -> Result<()> {
    let cols: String = (1..=WIDTH).map(|x| x.to_string()).collect();
    out.queue(PrintStyledContent(style(cols + "\n")))?;

    for row in (0..HEIGHT).rev() {
        for column in 1..=WIDTH {
            out.queue(PrintStyledContent(
                style("O")
                    .attribute(Attribute::Bold)
                    .on(Color::DarkBlue)
                    .with(match board.cell(column, row) {
                        Some(Player::Red) => Color::Red,
                        Some(Player::Yellow) => Color::Yellow,
                        None => Color::DarkBlue,
                    }),
            ))?;
        }
        out.queue(PrintStyledContent(style("\n")))?;
    }
    out.flush()?;
    Ok(())
}

pub fn print_board(board: &BitBoard) -> Result<()> {
    draw(&mut stdout(), board)
}

// plain text rendering, X for Red and O for Yellow
impl fmt::Display for BitBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..HEIGHT).rev() {
            for column in 1..=WIDTH {
                let tile = match self.cell(column, row) {
                    Some(Player::Red) => 'X',
                    Some(Player::Yellow) => 'O',
                    None => '.',
                };
                write!(f, "{}", tile)?;
            }
            writeln!(f)?;
        }
        let cols: String = (1..=WIDTH).map(|x| x.to_string()).collect();
        write!(f, "{}", cols)
    }
}

//! CSV-like landmark output.
//!
//! Each completed image produces one row: the image name followed by the x
//! and y of landmarks 1..=68 in landmark order. Unset landmarks write the
//! sentinel `(-1,-1)` in place of each coordinate. The bounding rectangle is
//! not part of the row.

use std::io::{self, Write};

use crate::landmarks::{LandmarkSet, Point, LANDMARK_COUNT};

/// Written in place of a coordinate that was never annotated.
pub const SENTINEL: Point = Point { x: -1, y: -1 };

/// Number of logical fields per row: the name plus x and y per landmark.
pub const FIELD_COUNT: usize = 1 + 2 * LANDMARK_COUNT;

/// Column names: `image_name,x_0..x_67,y_0..y_67`.
pub fn header() -> String {
    let mut cols = Vec::with_capacity(FIELD_COUNT);
    cols.push("image_name".to_string());
    cols.extend((0..LANDMARK_COUNT).map(|i| format!("x_{i}")));
    cols.extend((0..LANDMARK_COUNT).map(|i| format!("y_{i}")));
    cols.join(",")
}

/// Logical fields of one row, without the trailing newline.
pub fn row_fields(image_name: &str, landmarks: &LandmarkSet) -> Vec<String> {
    let mut fields = Vec::with_capacity(FIELD_COUNT);
    fields.push(image_name.to_string());
    for (_, point) in landmarks.points() {
        match point {
            Some(p) => {
                fields.push(p.x.to_string());
                fields.push(p.y.to_string());
            }
            None => {
                fields.push(SENTINEL.to_string());
                fields.push(SENTINEL.to_string());
            }
        }
    }
    fields
}

pub fn format_row(image_name: &str, landmarks: &LandmarkSet) -> String {
    row_fields(image_name, landmarks).join(",")
}

/// Appends landmark rows to the output file and echoes them to a second sink
/// (stdout in the binary).
pub struct LandmarkWriter<F: Write, E: Write> {
    file: F,
    echo: E,
    header_written: bool,
    repeat_header: bool,
    rows: usize,
}

impl<F: Write, E: Write> LandmarkWriter<F, E> {
    pub fn new(file: F, echo: E) -> Self {
        Self {
            file,
            echo,
            header_written: false,
            repeat_header: true,
            rows: 0,
        }
    }

    /// Whether the header precedes every row (the default) or only the first
    /// row written by this writer.
    pub fn repeat_header(mut self, repeat: bool) -> Self {
        self.repeat_header = repeat;
        self
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn write_record(&mut self, image_name: &str, landmarks: &LandmarkSet) -> io::Result<()> {
        if !self.header_written || self.repeat_header {
            self.write_line(&header())?;
            self.header_written = true;
        }
        self.write_line(&format_row(image_name, landmarks))?;
        self.file.flush()?;
        self.echo.flush()?;
        self.rows += 1;
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.echo, "{line}")?;
        writeln!(self.file, "{line}")
    }

    pub fn into_inner(self) -> (F, E) {
        (self.file, self.echo)
    }
}

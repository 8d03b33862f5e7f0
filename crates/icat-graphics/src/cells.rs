//! Unicode placeholder cells
//!
//! A virtual placement is drawn wherever the terminal finds the placeholder
//! character `U+10EEEE`. Combining diacritics on each placeholder select the
//! row, the column and the most significant id byte; the cell's foreground
//! colour carries the least significant id byte.

use crate::id::ImageId;
use crate::GraphicsError;
use crossterm::style::{Color, SetForegroundColor};

/// Placeholder character the terminal replaces with image content
pub const PLACEHOLDER: char = '\u{10EEEE}';

/// Largest row or column index a diacritic can encode, plus one
pub const MAX_CELLS: u16 = ROWCOLUMN_DIACRITICS.len() as u16;

/// Combining characters encoding the numbers 0..297, in protocol order
const ROWCOLUMN_DIACRITICS: [char; 297] = [
    '\u{305}', '\u{30D}', '\u{30E}', '\u{310}', '\u{312}', '\u{33D}', '\u{33E}', '\u{33F}',
    '\u{346}', '\u{34A}', '\u{34B}', '\u{34C}', '\u{350}', '\u{351}', '\u{352}', '\u{357}',
    '\u{35B}', '\u{363}', '\u{364}', '\u{365}', '\u{366}', '\u{367}', '\u{368}', '\u{369}',
    '\u{36A}', '\u{36B}', '\u{36C}', '\u{36D}', '\u{36E}', '\u{36F}', '\u{483}', '\u{484}',
    '\u{485}', '\u{486}', '\u{487}', '\u{592}', '\u{593}', '\u{594}', '\u{595}', '\u{597}',
    '\u{598}', '\u{599}', '\u{59C}', '\u{59D}', '\u{59E}', '\u{59F}', '\u{5A0}', '\u{5A1}',
    '\u{5A8}', '\u{5A9}', '\u{5AB}', '\u{5AC}', '\u{5AF}', '\u{5C4}', '\u{610}', '\u{611}',
    '\u{612}', '\u{613}', '\u{614}', '\u{615}', '\u{616}', '\u{617}', '\u{657}', '\u{658}',
    '\u{659}', '\u{65A}', '\u{65B}', '\u{65D}', '\u{65E}', '\u{6D6}', '\u{6D7}', '\u{6D8}',
    '\u{6D9}', '\u{6DA}', '\u{6DB}', '\u{6DC}', '\u{6DF}', '\u{6E0}', '\u{6E1}', '\u{6E2}',
    '\u{6E4}', '\u{6E7}', '\u{6E8}', '\u{6EB}', '\u{6EC}', '\u{730}', '\u{732}', '\u{733}',
    '\u{735}', '\u{736}', '\u{73A}', '\u{73D}', '\u{73F}', '\u{740}', '\u{741}', '\u{743}',
    '\u{745}', '\u{747}', '\u{749}', '\u{74A}', '\u{7EB}', '\u{7EC}', '\u{7ED}', '\u{7EE}',
    '\u{7EF}', '\u{7F0}', '\u{7F1}', '\u{7F3}', '\u{816}', '\u{817}', '\u{818}', '\u{819}',
    '\u{81B}', '\u{81C}', '\u{81D}', '\u{81E}', '\u{81F}', '\u{820}', '\u{821}', '\u{822}',
    '\u{823}', '\u{825}', '\u{826}', '\u{827}', '\u{829}', '\u{82A}', '\u{82B}', '\u{82C}',
    '\u{82D}', '\u{951}', '\u{953}', '\u{954}', '\u{F82}', '\u{F83}', '\u{F86}', '\u{F87}',
    '\u{135D}', '\u{135E}', '\u{135F}', '\u{17DD}', '\u{193A}', '\u{1A17}', '\u{1A75}', '\u{1A76}',
    '\u{1A77}', '\u{1A78}', '\u{1A79}', '\u{1A7A}', '\u{1A7B}', '\u{1A7C}', '\u{1B6B}', '\u{1B6D}',
    '\u{1B6E}', '\u{1B6F}', '\u{1B70}', '\u{1B71}', '\u{1B72}', '\u{1B73}', '\u{1CD0}', '\u{1CD1}',
    '\u{1CD2}', '\u{1CDA}', '\u{1CDB}', '\u{1CE0}', '\u{1DC0}', '\u{1DC1}', '\u{1DC3}', '\u{1DC4}',
    '\u{1DC5}', '\u{1DC6}', '\u{1DC7}', '\u{1DC8}', '\u{1DC9}', '\u{1DCB}', '\u{1DCC}', '\u{1DD1}',
    '\u{1DD2}', '\u{1DD3}', '\u{1DD4}', '\u{1DD5}', '\u{1DD6}', '\u{1DD7}', '\u{1DD8}', '\u{1DD9}',
    '\u{1DDA}', '\u{1DDB}', '\u{1DDC}', '\u{1DDD}', '\u{1DDE}', '\u{1DDF}', '\u{1DE0}', '\u{1DE1}',
    '\u{1DE2}', '\u{1DE3}', '\u{1DE4}', '\u{1DE5}', '\u{1DE6}', '\u{1DFE}', '\u{20D0}', '\u{20D1}',
    '\u{20D4}', '\u{20D5}', '\u{20D6}', '\u{20D7}', '\u{20DB}', '\u{20DC}', '\u{20E1}', '\u{20E7}',
    '\u{20E9}', '\u{20F0}', '\u{2CEF}', '\u{2CF0}', '\u{2CF1}', '\u{2DE0}', '\u{2DE1}', '\u{2DE2}',
    '\u{2DE3}', '\u{2DE4}', '\u{2DE5}', '\u{2DE6}', '\u{2DE7}', '\u{2DE8}', '\u{2DE9}', '\u{2DEA}',
    '\u{2DEB}', '\u{2DEC}', '\u{2DED}', '\u{2DEE}', '\u{2DEF}', '\u{2DF0}', '\u{2DF1}', '\u{2DF2}',
    '\u{2DF3}', '\u{2DF4}', '\u{2DF5}', '\u{2DF6}', '\u{2DF7}', '\u{2DF8}', '\u{2DF9}', '\u{2DFA}',
    '\u{2DFB}', '\u{2DFC}', '\u{2DFD}', '\u{2DFE}', '\u{2DFF}', '\u{A66F}', '\u{A67C}', '\u{A67D}',
    '\u{A6F0}', '\u{A6F1}', '\u{A8E0}', '\u{A8E1}', '\u{A8E2}', '\u{A8E3}', '\u{A8E4}', '\u{A8E5}',
    '\u{A8E6}', '\u{A8E7}', '\u{A8E8}', '\u{A8E9}', '\u{A8EA}', '\u{A8EB}', '\u{A8EC}', '\u{A8ED}',
    '\u{A8EE}', '\u{A8EF}', '\u{A8F0}', '\u{A8F1}', '\u{AAB0}', '\u{AAB2}', '\u{AAB3}', '\u{AAB7}',
    '\u{AAB8}', '\u{AABE}', '\u{AABF}', '\u{AAC1}', '\u{FE20}', '\u{FE21}', '\u{FE22}', '\u{FE23}',
    '\u{FE24}', '\u{FE25}', '\u{FE26}', '\u{10A0F}', '\u{10A38}', '\u{1D185}', '\u{1D186}', '\u{1D187}',
    '\u{1D188}', '\u{1D189}', '\u{1D1AA}', '\u{1D1AB}', '\u{1D1AC}', '\u{1D1AD}', '\u{1D242}', '\u{1D243}',
    '\u{1D244}',
];

/// Diacritic encoding `index`
pub fn diacritic(index: u16) -> Option<char> {
    ROWCOLUMN_DIACRITICS.get(usize::from(index)).copied()
}

fn diacritic_or_err(index: u16, columns: u16, rows: u16) -> Result<char, GraphicsError> {
    diacritic(index).ok_or(GraphicsError::TooLarge {
        columns,
        rows,
        max: MAX_CELLS,
    })
}

/// One placeholder cell, without colour
pub fn cell_marker(id: ImageId, row: u16, column: u16) -> Result<String, GraphicsError> {
    let (columns, rows) = (column.saturating_add(1), row.saturating_add(1));
    let mut cell = String::with_capacity(16);
    cell.push(PLACEHOLDER);
    cell.push(diacritic_or_err(row, columns, rows)?);
    cell.push(diacritic_or_err(column, columns, rows)?);
    cell.push(diacritic_or_err(u16::from(id.upper()), columns, rows)?);
    Ok(cell)
}

/// Marker text for a `rows` x `columns` placement, one string per row.
/// Each row starts with the colour selecting the low id byte and ends by
/// resetting the foreground colour.
pub fn marker_lines(id: ImageId, columns: u16, rows: u16) -> Result<Vec<String>, GraphicsError> {
    if columns > MAX_CELLS || rows > MAX_CELLS {
        return Err(GraphicsError::TooLarge {
            columns,
            rows,
            max: MAX_CELLS,
        });
    }

    let color = SetForegroundColor(Color::AnsiValue(id.lower())).to_string();
    let reset = SetForegroundColor(Color::Reset).to_string();

    (0..rows)
        .map(|row| {
            let mut line = color.clone();
            for column in 0..columns {
                line.push_str(&cell_marker(id, row, column)?);
            }
            line.push_str(&reset);
            Ok(line)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_bounds() {
        assert_eq!(MAX_CELLS, 297);
        assert_eq!(diacritic(0), Some('\u{305}'));
        assert_eq!(diacritic(1), Some('\u{30D}'));
        assert_eq!(diacritic(296), Some('\u{1D244}'));
        assert_eq!(diacritic(297), None);
    }

    #[test]
    fn test_cell_marker_order() {
        let id = ImageId::new(2, 9);
        let cell = cell_marker(id, 1, 0).unwrap();
        let chars: Vec<char> = cell.chars().collect();
        assert_eq!(chars, vec![PLACEHOLDER, '\u{30D}', '\u{305}', '\u{30E}']);
    }

    #[test]
    fn test_marker_lines_shape() {
        let id = ImageId::new(0, 196);
        let lines = marker_lines(id, 3, 2).unwrap();
        assert_eq!(lines.len(), 2);
        for (row, line) in lines.iter().enumerate() {
            assert!(line.starts_with("\x1b[38;5;196m"));
            assert!(line.ends_with("\x1b[39m"));
            assert_eq!(line.matches(PLACEHOLDER).count(), 3);
            let second: Vec<char> = line.chars().skip_while(|c| *c != PLACEHOLDER).collect();
            assert_eq!(second[1], diacritic(row as u16).unwrap());
        }
    }

    #[test]
    fn test_marker_lines_rejects_oversized() {
        let id = ImageId::new(1, 1);
        assert!(matches!(
            marker_lines(id, 298, 1),
            Err(GraphicsError::TooLarge { columns: 298, .. })
        ));
        assert!(marker_lines(id, 297, 1).is_ok());
    }
}

//! QGC WPL 110 mission files
//!
//! Tab separated text, one record per line after a fixed header:
//! `seq current frame command param1 param2 param3 param4 x y z autocontinue`

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::MissionFileError;
use crate::types::{CommandRecord, MissionPlan};

pub const WPL_HEADER: &str = "QGC WPL 110";

const COLUMNS: [&str; 12] = [
    "seq",
    "current",
    "frame",
    "command",
    "param1",
    "param2",
    "param3",
    "param4",
    "x",
    "y",
    "z",
    "autocontinue",
];

fn parse_float(line: usize, column: usize, text: &str) -> Result<f64, MissionFileError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| MissionFileError::BadValue {
            line,
            column: COLUMNS[column],
            value: text.to_string(),
        })
}

/// Integer column; accepts `16` as well as `16.0` from spreadsheet exports.
fn parse_int<T: TryFrom<i64>>(
    line: usize,
    column: usize,
    text: &str,
) -> Result<T, MissionFileError> {
    let bad = || MissionFileError::BadValue {
        line,
        column: COLUMNS[column],
        value: text.to_string(),
    };
    let trimmed = text.trim();
    let value = match trimmed.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f = trimmed.parse::<f64>().map_err(|_| bad())?;
            if f.fract() != 0.0 || !f.is_finite() {
                return Err(bad());
            }
            f as i64
        }
    };
    T::try_from(value).map_err(|_| bad())
}

fn parse_record(line: usize, text: &str) -> Result<CommandRecord, MissionFileError> {
    let fields: Vec<&str> = text.split('\t').collect();
    if fields.len() != COLUMNS.len() {
        return Err(MissionFileError::FieldCount {
            line,
            found: fields.len(),
        });
    }

    Ok(CommandRecord {
        seq: parse_int(line, 0, fields[0])?,
        current: parse_int(line, 1, fields[1])?,
        frame: parse_int(line, 2, fields[2])?,
        command: parse_int(line, 3, fields[3])?,
        param1: parse_float(line, 4, fields[4])?,
        param2: parse_float(line, 5, fields[5])?,
        param3: parse_float(line, 6, fields[6])?,
        param4: parse_float(line, 7, fields[7])?,
        x: parse_float(line, 8, fields[8])?,
        y: parse_float(line, 9, fields[9])?,
        z: parse_float(line, 10, fields[10])?,
        autocontinue: parse_int(line, 11, fields[11])?,
    })
}

/// Parse a whole mission file.
pub fn read_mission<R: BufRead>(reader: R) -> Result<MissionPlan, MissionFileError> {
    let mut lines = reader.lines();

    let header = lines.next().transpose()?.unwrap_or_default();
    // tolerate a UTF-8 BOM from Windows editors
    let header = header.trim_start_matches('\u{feff}').trim();
    if header != WPL_HEADER {
        return Err(MissionFileError::BadHeader(header.to_string()));
    }

    let mut plan = MissionPlan::new();
    for (offset, line) in lines.enumerate() {
        let line = line?;
        let text = line.trim_end_matches('\r');
        if text.trim().is_empty() {
            continue;
        }
        // header is line 1
        plan.push(parse_record(offset + 2, text)?);
    }
    Ok(plan)
}

/// Write `plan` with `seq` renumbered to the output order.
pub fn write_mission<W: Write>(mut writer: W, plan: &MissionPlan) -> Result<(), MissionFileError> {
    writeln!(writer, "{}", WPL_HEADER)?;
    for (seq, r) in plan.iter().enumerate() {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            seq,
            r.current,
            r.frame,
            r.command,
            r.param1,
            r.param2,
            r.param3,
            r.param4,
            r.x,
            r.y,
            r.z,
            r.autocontinue
        )?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_mission_file(path: &Path) -> Result<MissionPlan, MissionFileError> {
    let file = File::open(path)?;
    read_mission(BufReader::new(file))
}

/// Replace `path` with the serialized plan.
pub fn write_mission_file(path: &Path, plan: &MissionPlan) -> Result<(), MissionFileError> {
    let file = File::create(path)?;
    write_mission(BufWriter::new(file), plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CMD_WAYPOINT;

    const SAMPLE: &str = "QGC WPL 110\n\
0\t1\t0\t16\t0\t0\t0\t0\t47.3977419\t8.5455938\t488.0\t1\n\
1\t0\t3\t115\t270\t0\t0\t0\t0\t0\t0\t1\n\
2\t0\t3\t217\t2\t1\t0\t0\t0\t0\t0\t1\n";

    #[test]
    fn test_read_sample() {
        let plan = read_mission(SAMPLE.as_bytes()).unwrap();
        assert_eq!(plan.len(), 3);

        let home = plan.get(0).unwrap();
        assert_eq!(home.command, CMD_WAYPOINT);
        assert_eq!(home.current, 1);
        assert_eq!(home.x, 47.3977419);
        assert_eq!(home.z, 488.0);
        assert!(plan.get(2).unwrap().is_spray_activation());
    }

    #[test]
    fn test_write_renumbers_and_keeps_header() {
        let mut plan = read_mission(SAMPLE.as_bytes()).unwrap();
        plan.push(CommandRecord::condition_distance(6.0));

        let mut buf = Vec::new();
        write_mission(&mut buf, &plan).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], WPL_HEADER);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "3\t0\t0\t114\t6\t0\t0\t0\t0\t0\t0\t1");
        assert!(lines[1].starts_with("0\t1\t0\t16\t"));

        let again = read_mission(text.as_bytes()).unwrap();
        assert_eq!(again.get(1), plan.get(1));
    }

    #[test]
    fn test_float_integer_columns_and_crlf() {
        let text = "QGC WPL 110\r\n0\t0\t3.0\t16.0\t0\t0\t0\t0\t1\t2\t3\t1\r\n\r\n";
        let plan = read_mission(text.as_bytes()).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.get(0).unwrap().frame, 3);
        assert_eq!(plan.get(0).unwrap().command, 16);
    }

    #[test]
    fn test_bad_header() {
        let err = read_mission("QGC WPL 120\n".as_bytes()).unwrap_err();
        assert!(matches!(err, MissionFileError::BadHeader(h) if h == "QGC WPL 120"));

        let err = read_mission("".as_bytes()).unwrap_err();
        assert!(matches!(err, MissionFileError::BadHeader(_)));
    }

    #[test]
    fn test_field_count_reports_line() {
        let text = "QGC WPL 110\n0\t0\t3\t16\t0\t0\t0\t0\t1\t2\t3\t1\n1\t0\t3\t16\t0\n";
        let err = read_mission(text.as_bytes()).unwrap_err();
        assert!(matches!(err, MissionFileError::FieldCount { line: 3, found: 5 }));
    }

    #[test]
    fn test_bad_value_names_column() {
        let text = "QGC WPL 110\n0\t0\t3\t16.5\t0\t0\t0\t0\t1\t2\t3\t1\n";
        let err = read_mission(text.as_bytes()).unwrap_err();
        match err {
            MissionFileError::BadValue { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, "command");
            }
            other => panic!("unexpected error {other}"),
        }

        let text = "QGC WPL 110\n0\t0\t3\t16\tabc\t0\t0\t0\t1\t2\t3\t1\n";
        let err = read_mission(text.as_bytes()).unwrap_err();
        assert!(matches!(err, MissionFileError::BadValue { column: "param1", .. }));
    }
}

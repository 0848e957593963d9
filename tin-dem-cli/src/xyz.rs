use crate::error::{Error, Result};
use std::io::BufRead;
use tin_dem_core::{points::PointSet, Scalar};

/// Reads points from XYZ text.
///
/// Columns are separated by whitespace, commas or semicolons and only the first three are used.
/// Empty lines and `#` comments are skipped anywhere, lines starting with a non-numeric column
/// only before the first point.
pub fn read_xyz<R: BufRead>(reader: R) -> Result<PointSet> {
    let mut points = PointSet::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut columns = line
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|c| !c.is_empty())
            .map(|c| c.parse::<Scalar>());
        match columns.next() {
            Some(Ok(x)) => {
                let mut value = || match columns.next() {
                    Some(Ok(v)) => Ok(v),
                    Some(Err(error)) => Err(Error::Parse {
                        line: index + 1,
                        message: error.to_string(),
                    }),
                    None => Err(Error::Parse {
                        line: index + 1,
                        message: "expected at least three columns".to_owned(),
                    }),
                };
                let y = value()?;
                let z = value()?;
                points.push(x, y, z);
            }
            Some(Err(_)) if points.is_empty() => {
                tracing::debug!(line = index + 1, "skipped header line");
            }
            Some(Err(error)) => {
                return Err(Error::Parse {
                    line: index + 1,
                    message: error.to_string(),
                })
            }
            None => {}
        }
    }
    tracing::info!(points = points.len(), "read XYZ points");
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators_and_headers() {
        let text = "x y z\n# comment\n0 0 1.5\n1,0,2,intensity\n\n0;1;3\n  2.5e1\t4  -1 7\n";
        let points = read_xyz(text.as_bytes()).unwrap();
        assert_eq!(points.x, vec![0.0, 1.0, 0.0, 25.0]);
        assert_eq!(points.y, vec![0.0, 0.0, 1.0, 4.0]);
        assert_eq!(points.z, vec![1.5, 2.0, 3.0, -1.0]);
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(
            read_xyz("0 0 1\n1 0\n".as_bytes()),
            Err(Error::Parse { line: 2, .. })
        ));
        assert!(matches!(
            read_xyz("0 0 1\nx y z\n".as_bytes()),
            Err(Error::Parse { line: 2, .. })
        ));
        assert!(matches!(
            read_xyz("0 0 1\n1 zero 2\n".as_bytes()),
            Err(Error::Parse { line: 2, .. })
        ));
    }
}

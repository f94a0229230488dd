use super::Error;
use crate::model::structure::{Site, Structure};
use crate::model::types::Element;

/// Builds a structure from the flat columns both ASE backends store.
///
/// `positions` holds `numbers.len() * 3` values; `cell` is empty (no cell)
/// or nine row-major values.
pub(super) fn assemble(
    row_id: i64,
    numbers: &[i64],
    positions: &[f64],
    cell: &[f64],
    pbc: [bool; 3],
) -> Result<Structure, Error> {
    if positions.len() != numbers.len() * 3 {
        return Err(Error::corrupt(
            row_id,
            format!(
                "{} position values for {} atoms",
                positions.len(),
                numbers.len()
            ),
        ));
    }

    let sites = numbers
        .iter()
        .zip(positions.chunks_exact(3))
        .map(|(&number, xyz)| {
            Element::from_atomic_number(number)
                .map(|element| Site::new(element, [xyz[0], xyz[1], xyz[2]]))
                .ok_or(Error::UnknownAtomicNumber { row_id, number })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = [[0.0; 3]; 3];
    match cell.len() {
        0 => {}
        9 => {
            for (row, chunk) in rows.iter_mut().zip(cell.chunks_exact(3)) {
                row.copy_from_slice(chunk);
            }
        }
        n => return Err(Error::corrupt(row_id, format!("cell has {n} values, expected 9"))),
    }

    Ok(Structure {
        sites,
        cell: rows,
        pbc,
    })
}

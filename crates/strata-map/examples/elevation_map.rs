use nalgebra::Vector2;
use strata_map::{CellIndex, GridMap};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Create a 10x8 map with 0.25m resolution centred at (1, -1)
    let mut map = GridMap::new(10, 8, 0.25, Vector2::new(1.0, -1.0))?;

    // Gentle ramp along x
    map.add_layer_from_fn("elevation", |p| (0.1 * p.x) as f32);
    map.add_constant_layer("variance", 0.01);

    // Demonstrate index/position conversion
    let index = CellIndex::new(0, 0);
    let position = map.position_of(index)?;
    println!(
        "Cell ({}, {}) is centred at ({:.3}, {:.3})",
        index.row, index.col, position.x, position.y
    );

    let back = map.index_of(&position)?;
    println!("Position maps back to cell ({}, {})", back.row, back.col);

    let outside = Vector2::new(10.0, 10.0);
    match map.index_of(&outside) {
        Ok(_) => println!("Unexpected: {:?} is inside", outside),
        Err(e) => println!("Lookup failed as expected: {}", e),
    }

    print!("{}", map);
    Ok(())
}

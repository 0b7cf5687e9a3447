use nalgebra::{Vector2, Vector3};
use strata_map::GridMap;
use strata_sdf::SignedDistanceField;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 40x40 map with 5cm cells, centred on the origin
    let mut map = GridMap::new(40, 40, 0.05, Vector2::zeros())?;

    // A 30cm step: everything with negative x is raised
    map.add_layer_from_fn("elevation", |p| if p.x < 0.0 { 0.3 } else { 0.0 });
    println!("{}", map);

    let sdf = SignedDistanceField::new(&map, "elevation", -0.2, 0.8)?;
    let size = sdf.lookup().size();
    println!(
        "Field: {}x{}x{} nodes ({} samples)",
        size.rows,
        size.cols,
        size.layers,
        sdf.len()
    );

    // Walk towards the step at the height of the lower floor plus 15cm
    for i in 0..=10 {
        let x = 0.5 - 0.1 * i as f64;
        let position = Vector3::new(x, 0.0, 0.15);
        let (distance, gradient) = sdf.value_and_gradient_at(&position);
        println!(
            "p = ({:5.2}, {:5.2}, {:5.2})  d = {:6.3}  grad = ({:6.3}, {:6.3}, {:6.3})",
            position.x, position.y, position.z, distance, gradient.x, gradient.y, gradient.z
        );
    }

    let cloud = sdf.as_point_cloud();
    let inside = cloud.iter().filter(|p| p.intensity < 0.0).count();
    println!("{} of {} nodes are inside the terrain", inside, cloud.len());

    Ok(())
}

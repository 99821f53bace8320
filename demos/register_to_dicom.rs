use regframe::{CoordinateTransformer, FrameDirection, TransformSource};

const CASE_TRANSFORM: &str = r#"{
  "matrix": [
    [0.0, -1.0, 0.0, -21.979],
    [1.0, 0.0, 0.0, 54.0],
    [0.0, 0.0, 1.0, -658.0],
    [0.0, 0.0, 0.0, 1.0]
  ],
  "description": "rMd",
  "notes": "L1R screw plan"
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt::init();

  let mut store = CoordinateTransformer::new();
  let target = [102.4, 102.4, 70.0];
  println!("before registration: {}", store.convert_to_dicom(target));

  let source: TransformSource = CASE_TRANSFORM.parse()?;
  store.load_transform(source)?;

  let dicom = store.convert_to_dicom(target);
  let register = store.convert_to_register(dicom);
  println!("register {target:?} -> dicom {dicom} -> register {register}");

  let path = [[0.0, 0.0, 0.0], [0.0, 0.0, 10.0], [0.0, 0.0, 20.0]];
  for p in store.convert_all(FrameDirection::RegisterToDicom, path) {
    println!("trajectory point: {p}");
  }

  if let Err(err) = store.load_transform([[0.0; 4]; 4]) {
    println!("rejected: {err}");
  }
  println!("{}", serde_json::to_string_pretty(&store.get_transform())?);
  Ok(())
}

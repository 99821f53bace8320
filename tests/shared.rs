use std::thread;

use regframe::{CoordinateTransformer, FrameDirection, Position, SharedTransformer};

fn translation(x: f64) -> [[f64; 4]; 4] {
  [
    [1.0, 0.0, 0.0, x],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
  ]
}

#[test]
fn readers_see_whole_transforms() {
  let shared = SharedTransformer::new();
  shared.load_transform(translation(10.0)).unwrap();

  thread::scope(|s| {
    let writer = shared.clone();
    s.spawn(move || {
      for i in 0..2000 {
        let x = if i % 2 == 0 { -5.0 } else { 10.0 };
        writer.load_transform(translation(x)).unwrap();
        if i % 7 == 0 {
          // rejected loads must not disturb readers either
          writer.load_transform([[0.0; 4]; 4]).unwrap_err();
        }
      }
    });

    for _ in 0..4 {
      let reader = shared.clone();
      s.spawn(move || {
        for _ in 0..2000 {
          let guard = reader.read();
          let register = guard.convert_to_register([0.0, 0.0, 0.0]);
          let dicom = guard.convert_to_dicom([0.0, 0.0, 0.0]);
          assert!(register.x == 10.0 || register.x == -5.0, "{register}");
          assert_eq!(dicom.x, -register.x);
          assert!(guard.has_transform());
          drop(guard);

          let snapshot = reader.get_transform();
          let forward = snapshot.transform.unwrap();
          let inverse = snapshot.inverse_transform.unwrap();
          assert_eq!(forward[0][3], -inverse[0][3]);
        }
      });
    }
  });

  assert_eq!(shared.convert_to_register([0.0, 0.0, 0.0]), Position::new(10.0, 0.0, 0.0));
}

#[test]
fn handle_wraps_existing_store() {
  let mut store = CoordinateTransformer::new();
  store.load_transform(translation(3.0)).unwrap();
  let shared = SharedTransformer::from(store);
  assert!(shared.has_transform());
  assert!(!shared.is_identity_transform());
  assert_eq!(
    shared.convert_all(FrameDirection::DicomToRegister, [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]),
    vec![Position::new(3.0, 0.0, 0.0), Position::new(4.0, 1.0, 1.0)]
  );

  let other = shared.clone();
  other.clear();
  assert!(!shared.has_transform());
  assert_eq!(shared.convert_to_dicom([1.0, 2.0, 3.0]), Position::new(1.0, 2.0, 3.0));
}

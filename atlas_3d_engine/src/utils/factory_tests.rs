use super::*;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Shape {
    Square,
    Circle,
}

fn make_factory() -> Factory<Shape, String, u32> {
    let factory = Factory::new("atlas3d::test");
    factory.register(Shape::Square, |side: &u32| Ok(format!("square {}", side)));
    factory
}

#[test]
fn test_construct_registered() {
    let factory = make_factory();
    assert_eq!(factory.construct(&Shape::Square, &4).unwrap(), "square 4");
    assert!(factory.contains(&Shape::Square));
    assert_eq!(factory.len(), 1);
}

#[test]
fn test_construct_missing_is_not_found() {
    let factory = make_factory();
    let result = factory.construct(&Shape::Circle, &1);
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_register_replaces() {
    let factory = make_factory();
    let replaced = factory.register(Shape::Square, |side: &u32| Ok(format!("big square {}", side * 2)));
    assert!(replaced);
    assert_eq!(factory.construct(&Shape::Square, &2).unwrap(), "big square 4");
}

#[test]
fn test_constructor_error_is_propagated() {
    let factory: Factory<Shape, String, u32> = Factory::new("atlas3d::test");
    factory.register(Shape::Circle, |_| Err(Error::BackendError("no device".to_string())));
    assert_eq!(
        factory.construct(&Shape::Circle, &0),
        Err(Error::BackendError("no device".to_string()))
    );
}

#[test]
fn test_unregister() {
    let factory = make_factory();
    assert!(factory.unregister(&Shape::Square));
    assert!(!factory.unregister(&Shape::Square));
    assert!(factory.is_empty());
}

//! Built-in compatibility suite
//!
//! Creation tests come first and are critical: if the sandbox cannot
//! create one of its kinds, nothing after it is meaningful.

use crate::sandbox::{Kind, PARENT};
use gauge_harness::{
    ensure, ensure_eq, AdapterError, Harness, HarnessResult, PropertyValue, ResourceHandle,
    TestCase, TestError, WeightTable,
};
use std::cell::Cell;
use std::rc::Rc;

/// Name given to the root folder created during setup
pub const WORKSPACE: &str = "Workspace";

type Root = Rc<Cell<Option<ResourceHandle>>>;

/// Weights of the built-in tests. `[weights]` entries in gauge.toml
/// override these.
pub fn default_weights() -> WeightTable {
    [
        ("create_part", 10),
        ("create_frame", 10),
        ("create_label", 10),
        ("create_folder", 5),
        ("reject_unsupported_kind", 5),
        ("part_property_roundtrip", 8),
        ("label_text_roundtrip", 5),
        ("color_roundtrip", 5),
        ("reject_type_mismatch", 5),
        ("reject_unknown_property", 3),
        ("parent_to_workspace", 8),
        ("dispose_cascades", 8),
        ("reject_parent_cycle", 3),
        ("bench_create_dispose", 4),
        ("bench_property_mutation", 4),
        ("stress_create_dispose", 3),
        ("leak_create_dispose", 6),
    ]
    .into_iter()
    .collect()
}

/// Register the suite and its setup hook on `harness`
pub fn install(harness: Harness) -> HarnessResult<Harness> {
    let root: Root = Rc::new(Cell::new(None));
    let setup_root = Rc::clone(&root);
    let mut harness = harness.with_setup(move |scope| {
        let folder = scope.create(Kind::Folder.name())?;
        scope.set(folder, "Name", WORKSPACE)?;
        setup_root.set(Some(folder));
        Ok(())
    });

    for case in cases(root) {
        harness.register(case)?;
    }
    Ok(harness)
}

fn cases(root: Root) -> Vec<TestCase> {
    let mut cases: Vec<TestCase> = Kind::ALL.into_iter().map(create_kind).collect();
    cases.extend([
        reject_unsupported_kind(),
        part_property_roundtrip(),
        label_text_roundtrip(),
        color_roundtrip(),
        reject_type_mismatch(),
        reject_unknown_property(),
        parent_to_workspace(root),
        dispose_cascades(),
        reject_parent_cycle(),
        bench_create_dispose(),
        bench_property_mutation(),
        stress_create_dispose(),
        leak_create_dispose(),
    ]);
    cases
}

/// Expect the adapter to refuse an operation, returning its error
fn rejected<T>(result: Result<T, TestError>, what: &str) -> Result<AdapterError, TestError> {
    match result {
        Err(TestError::Adapter(e)) => Ok(e),
        Err(other) => Err(other),
        Ok(_) => Err(TestError::Assertion(format!("{} was accepted", what))),
    }
}

fn create_kind(kind: Kind) -> TestCase {
    let name = format!("create_{}", kind.name().to_lowercase());
    TestCase::new(name, move |ctx| {
        let handle = ctx.sut.create(kind.name())?;
        ensure_eq(
            ctx.sut.get(handle, "Name")?,
            PropertyValue::from(kind.name()),
            "default Name",
        )
    })
    .critical()
}

fn reject_unsupported_kind() -> TestCase {
    TestCase::new("reject_unsupported_kind", |ctx| {
        let err = rejected(ctx.sut.create("Gadget"), "creating a Gadget")?;
        ensure(
            matches!(err, AdapterError::UnsupportedKind(_)),
            format!("expected an unsupported-kind error, got: {}", err),
        )
    })
}

fn part_property_roundtrip() -> TestCase {
    TestCase::new("part_property_roundtrip", |ctx| {
        let part = ctx.sut.create(Kind::Part.name())?;
        ctx.sut.set(part, "Size", 4.5)?;
        ctx.sut.set(part, "Anchored", true)?;
        ctx.sut.set(part, "Name", "Baseplate")?;
        ensure_eq(ctx.sut.get(part, "Size")?, PropertyValue::Number(4.5), "Size")?;
        ensure_eq(ctx.sut.get(part, "Anchored")?, PropertyValue::Bool(true), "Anchored")?;
        ensure_eq(ctx.sut.get(part, "Name")?, PropertyValue::from("Baseplate"), "Name")
    })
}

fn label_text_roundtrip() -> TestCase {
    TestCase::new("label_text_roundtrip", |ctx| {
        let label = ctx.sut.create(Kind::Label.name())?;
        ctx.sut.set(label, "Text", "Hello, sandbox")?;
        ctx.sut.set(label, "TextSize", 18.0)?;
        ensure_eq(
            ctx.sut.get(label, "Text")?,
            PropertyValue::from("Hello, sandbox"),
            "Text",
        )?;
        ensure_eq(ctx.sut.get(label, "TextSize")?, PropertyValue::Number(18.0), "TextSize")
    })
}

fn color_roundtrip() -> TestCase {
    TestCase::new("color_roundtrip", |ctx| {
        let red = PropertyValue::Color { r: 255, g: 0, b: 0 };
        let part = ctx.sut.create(Kind::Part.name())?;
        ctx.sut.set(part, "Color", red.clone())?;
        ensure_eq(ctx.sut.get(part, "Color")?, red, "Part.Color")?;

        let teal = PropertyValue::Color {
            r: 0,
            g: 128,
            b: 128,
        };
        let frame = ctx.sut.create(Kind::Frame.name())?;
        ctx.sut.set(frame, "BackgroundColor", teal.clone())?;
        ensure_eq(ctx.sut.get(frame, "BackgroundColor")?, teal, "Frame.BackgroundColor")
    })
}

fn reject_type_mismatch() -> TestCase {
    TestCase::new("reject_type_mismatch", |ctx| {
        let part = ctx.sut.create(Kind::Part.name())?;
        let err = rejected(ctx.sut.set(part, "Size", "large"), "text for Size")?;
        ensure(
            matches!(err, AdapterError::TypeMismatch { .. }),
            format!("expected a type mismatch, got: {}", err),
        )?;
        ensure_eq(ctx.sut.get(part, "Size")?, PropertyValue::Number(1.0), "Size after rejection")
    })
}

fn reject_unknown_property() -> TestCase {
    TestCase::new("reject_unknown_property", |ctx| {
        let label = ctx.sut.create(Kind::Label.name())?;
        let err = rejected(ctx.sut.set(label, "Anchored", true), "Label.Anchored")?;
        ensure(
            matches!(err, AdapterError::InvalidProperty { .. }),
            format!("expected an invalid-property error, got: {}", err),
        )
    })
}

fn parent_to_workspace(root: Root) -> TestCase {
    TestCase::new("parent_to_workspace", move |ctx| {
        let workspace = root
            .get()
            .ok_or_else(|| TestError::Assertion("workspace folder missing".to_string()))?;
        ensure_eq(ctx.sut.get(workspace, "Name")?, PropertyValue::from(WORKSPACE), "root Name")?;

        let part = ctx.sut.create(Kind::Part.name())?;
        ctx.sut.set(part, PARENT, workspace)?;
        ensure_eq(ctx.sut.get(part, PARENT)?, PropertyValue::from(workspace), "Parent")
    })
}

fn dispose_cascades() -> TestCase {
    TestCase::new("dispose_cascades", |ctx| {
        let folder = ctx.sut.create(Kind::Folder.name())?;
        let frame = ctx.sut.create(Kind::Frame.name())?;
        let label = ctx.sut.create(Kind::Label.name())?;
        ctx.sut.set(frame, PARENT, folder)?;
        ctx.sut.set(label, PARENT, frame)?;

        ctx.sut.release(folder);

        let err = rejected(ctx.sut.get(label, "Name"), "reading a disposed descendant")?;
        ensure_eq(err, AdapterError::UnknownHandle(label), "error for disposed label")
    })
}

fn reject_parent_cycle() -> TestCase {
    TestCase::new("reject_parent_cycle", |ctx| {
        let outer = ctx.sut.create(Kind::Folder.name())?;
        let inner = ctx.sut.create(Kind::Folder.name())?;
        ctx.sut.set(inner, PARENT, outer)?;
        rejected(ctx.sut.set(outer, PARENT, inner), "a parent cycle")?;
        ensure_eq(ctx.sut.get(outer, PARENT)?, PropertyValue::Handle(None), "outer Parent")
    })
}

fn bench_create_dispose() -> TestCase {
    TestCase::new("bench_create_dispose", |ctx| {
        let mean = ctx.benchmark("create_dispose", |sut| {
            let part = sut.create(Kind::Part.name())?;
            sut.release(part);
            Ok(())
        })?;
        ensure(mean > 0.0, "mean duration must be positive")
    })
}

fn bench_property_mutation() -> TestCase {
    TestCase::new("bench_property_mutation", |ctx| {
        let part = ctx.sut.create(Kind::Part.name())?;
        let mut size = 1.0;
        let mean = ctx.benchmark("set_size", |sut| {
            size += 0.5;
            sut.set(part, "Size", size)
        })?;
        ensure(mean > 0.0, "mean duration must be positive")
    })
}

fn stress_create_dispose() -> TestCase {
    TestCase::new("stress_create_dispose", |ctx| {
        let result = ctx.stress("create_parent_dispose", |sut| {
            let frame = sut.create(Kind::Frame.name())?;
            let label = sut.create(Kind::Label.name())?;
            sut.set(label, PARENT, frame)?;
            sut.release(frame);
            sut.release(label);
            Ok(())
        })?;
        ensure(result.operations > 0, "no operations completed")
    })
}

fn leak_create_dispose() -> TestCase {
    TestCase::new("leak_create_dispose", |ctx| {
        let verdict = ctx.leak_check("create_parent_dispose", |sut| {
            let frame = sut.create(Kind::Frame.name())?;
            let label = sut.create(Kind::Label.name())?;
            sut.set(label, PARENT, frame)?;
            sut.release(frame);
            // Already gone with its parent; disposal must tolerate that
            sut.release(label);
            Ok(())
        })?;
        ensure(
            !verdict.leaked,
            format!(
                "usage grew from {} to {} over {} cycles",
                verdict.before, verdict.after, verdict.cycles
            ),
        )
    })
}

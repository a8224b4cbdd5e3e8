mod common;

use common::{output_of, SharedOutput};
use mmt::error::ErrorKind;
use mmt::{ir, parse_source, Evaluator};
use pretty_assertions::assert_eq;
use std::io::Cursor;

const PROGRAM: &str = r#"
# ตัวอย่าง #
ให้ total คือ 0;
ให้ names เป็น ค่าคงที่ คือ ["a", "b"];
ให้ info คือ {"count": 2, "ratio": 0.5, "empty": ว่าง};

โปรแกรม add(ให้ a, ให้ b) {
    คืนค่า a + b;
}

ทำซ้ำ (ตั้งแต่ ให้ i คือ 0 จนถึง i < 4 โดยแต่ละรอบ i++) {
    ถ้า (i % 2 = 0) {
        ไปยังรอบถัดไป;
    } มิฉะนั้นถ้า (i > 10) {
        ออกจากการทำซ้ำ;
    } มิฉะนั้น {
        total คือ add(total, i);
    }
}

ให้ k คือ 0;
ทำ { k++; } ขณะ (k < 3);
names.เพิ่ม("c");
แสดงผล(total, " ", k, " ", names, " ", info.ratio * 4, " ", เปลี่ยนชนิดข้อมูล("7", จำนวนเต็ม) << 1, " ", ไม่ เท็จ, " ", -k);
"#;

#[test]
fn serialized_program_round_trips() {
    let program = parse_source(PROGRAM).expect("program should parse");
    let json = ir::to_json(&program).expect("program should serialize");
    let reloaded = ir::from_json(&json).expect("program should deserialize");
    assert_eq!(program, reloaded);
}

#[test]
fn serialized_program_behaves_like_the_source() {
    let program = parse_source(PROGRAM).expect("program should parse");
    let json = ir::to_json(&program).expect("program should serialize");
    let reloaded = ir::from_json(&json).expect("program should deserialize");

    let output = SharedOutput::default();
    let mut evaluator = Evaluator::with_io(Box::new(output.clone()), Box::new(Cursor::new(Vec::new())));
    evaluator.evaluate_program(&reloaded).expect("program should run");

    let expected = output_of(PROGRAM);
    assert_eq!(expected, "4 3 [a, b, c] 2 14 จริง -3");
    assert_eq!(output.text(), expected);
}

#[test]
fn serialized_nodes_are_tagged_and_positioned() {
    let program = parse_source("ให้ x คือ 1;").expect("program should parse");
    let json = ir::to_json(&program).expect("program should serialize");
    assert!(json.contains(r#""type": "VarDecl""#), "{}", json);
    assert!(json.contains(r#""kind": "Int""#), "{}", json);
    assert!(json.contains(r#""line": 1"#), "{}", json);
}

fn run_reloaded(source: &str) -> String {
    let program = parse_source(source).expect("program should parse");
    let json = ir::to_json(&program).expect("program should serialize");
    let reloaded = ir::from_json(&json).expect("program should deserialize");
    assert_eq!(program, reloaded);

    let output = SharedOutput::default();
    let mut evaluator = Evaluator::with_io(Box::new(output.clone()), Box::new(Cursor::new(Vec::new())));
    evaluator.evaluate_program(&reloaded).expect("program should run");
    output.text()
}

#[test]
fn deeply_nested_expressions_load_back() {
    let terms = vec!["1"; 300].join(" + ");
    let source = format!("แสดงผล({});", terms);
    assert_eq!(output_of(&source), "300");
    assert_eq!(run_reloaded(&source), "300");
}

#[test]
fn float_literals_keep_their_exact_value() {
    let source = "แสดงผล(974.6562790888756974);";
    let direct = output_of(source);
    assert_eq!(direct, "974.6562790888757");
    assert_eq!(run_reloaded(source), direct);
}

#[test]
fn malformed_program_files_are_parse_errors() {
    let error = ir::from_json(r#"{"statements": [{"type": "Nope"}]}"#).expect_err("should fail");
    assert_eq!(error.kind, ErrorKind::ParseError);
    assert!(error.message.starts_with("Malformed program file"));

    assert!(ir::from_json("not json").is_err());
}

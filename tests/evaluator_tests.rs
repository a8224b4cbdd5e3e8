mod common;

use common::{error_of, output_of, run, run_program};
use mmt::error::{ErrorKind, Span};
use mmt::module::MemoryLoader;
use pretty_assertions::assert_eq;

fn assert_error(source: &str, expected: &str) {
    let error = error_of(source);
    assert_eq!(error.kind, ErrorKind::RuntimeError);
    assert!(
        error.message.contains(expected),
        "expected an error containing {:?}, got {:?}",
        expected,
        error.message
    );
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[test]
fn arithmetic_promotes_to_float_where_needed() {
    assert_eq!(
        output_of(r#"แสดงผล(1 + 2.5, " ", 1 / 2, " ", 3 / 2, " ", 3 // 2, " ", 3 % 2, " ", 7.5 // 2, " ", 2 ** 3, " ", 1 ราก 5, " ", 10 - 4 * 2);"#),
        "3.5 0.5 1.5 1 1 3 8 5 2"
    );
}

#[test]
fn floor_division_rounds_down_and_modulo_truncates() {
    assert_eq!(output_of(r#"แสดงผล(-7 // 2, " ", -7 % 2);"#), "-4 -1");
}

#[test]
fn plus_concatenates_and_merges() {
    assert_eq!(output_of("แสดงผล([1, 2] + [3]);"), "[1, 2, 3]");
    assert_eq!(output_of(r#"แสดงผล("สวัส" + "ดี");"#), "สวัสดี");
    assert_eq!(
        output_of(r#"แสดงผล({"a": 1, "b": 2} + {"b": 3, "c": 4});"#),
        r#"{"a": 1, "b": 3, "c": 4}"#
    );
}

#[test]
fn plus_builds_a_new_array() {
    assert_eq!(
        output_of("ให้ a คือ [1]; ให้ b คือ a + [2]; b.เพิ่ม(3); แสดงผล(a, b);"),
        "[1][1, 2, 3]"
    );
}

#[test]
fn values_render_for_print() {
    assert_eq!(
        output_of(r#"แสดงผล(จริง, " ", เท็จ, " ", ว่าง, " ", 2.0, " ", ["x", 1.5]);"#),
        "จริง เท็จ ว่าง 2 [x, 1.5]"
    );
}

#[test]
fn equality_is_strict_about_types() {
    assert_eq!(
        output_of(r#"แสดงผล(1 = 1.0, " ", 1 = 1, " ", [1, 2] = [1, 2], " ", "a" != "b", " ", ว่าง = ว่าง);"#),
        "เท็จ จริง จริง จริง จริง"
    );
}

#[test]
fn logical_and_bitwise_operators() {
    assert_eq!(
        output_of(r#"แสดงผล(1 และ จริง, " ", 0 หรือ เท็จ, " ", 6 & 3, " ", จริง ซอร์ จริง, " ", 1 | จริง, " ", !0, " ", !จริง, " ", 1 << 4);"#),
        "จริง เท็จ 2 เท็จ 1 -1 -2 16"
    );
    assert_eq!(output_of("แสดงผล(ไม่ จริง, ไม่ 0, ไม่ 2.5);"), "เท็จจริงเท็จ");
}

#[test]
fn comparisons_mix_numeric_types() {
    assert_eq!(output_of("แสดงผล(1 < 1.5, 2 >= 2, 3.0 <= 2, 4 > 3);"), "จริงจริงเท็จจริง");
}

#[test]
fn natural_log() {
    assert_eq!(output_of("แสดงผล(ln(1));"), "0");
}

#[test]
fn unsupported_operands_are_reported() {
    assert_error(r#"แสดงผล("a" - 1);"#, r#"Cannot apply '-' to "a" (string) and 1 (int)"#);
}

#[test]
fn runtime_division_by_zero() {
    assert_error("ให้ z คือ 0; แสดงผล(1 / z);", "Division by zero");
    assert_error("ให้ z คือ 0.0; แสดงผล(1.5 % z);", "Division by zero");
    assert_error("ให้ z คือ 0; แสดงผล(z ราก 4);", "Root degree must not be zero");
}

#[test]
fn integer_overflow_is_an_error() {
    assert_error("ให้ big คือ 9223372036854775807; แสดงผล(big + 1);", "Integer overflow");
}

#[test]
fn shift_amount_must_fit() {
    assert_error("แสดงผล(1 << 64);", "Shift amount 64");
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

#[test]
fn conversions_between_scalar_types() {
    assert_eq!(
        output_of(
            r#"แสดงผล(เปลี่ยนชนิดข้อมูล(" 42 ", จำนวนเต็ม) + 1, " ", เปลี่ยนชนิดข้อมูล(3.9, จำนวนเต็ม), " ", เปลี่ยนชนิดข้อมูล(2, ทศนิยม) / 4, " ", เปลี่ยนชนิดข้อมูล(1.5, ข้อความ) + "!", " ", เปลี่ยนชนิดข้อมูล(0, ค่าความจริง));"#
        ),
        "43 3 0.5 1.5! เท็จ"
    );
}

#[test]
fn failed_conversions_are_errors() {
    assert_error(r#"แสดงผล(เปลี่ยนชนิดข้อมูล("abc", จำนวนเต็ม));"#, "Cannot convert");
    assert_error("แสดงผล(เปลี่ยนชนิดข้อมูล(จริง, ข้อความ));", "Cannot convert");
    assert_error("แสดงผล(เปลี่ยนชนิดข้อมูล([1], ทศนิยม));", "Cannot convert");
}

// ---------------------------------------------------------------------------
// Variables and scopes
// ---------------------------------------------------------------------------

#[test]
fn blocks_introduce_scopes() {
    let source = "
ให้ x คือ 1;
{
    ให้ x คือ 2;
    แสดงผล(x);
}
แสดงผล(x);
";
    assert_eq!(output_of(source), "21");
    assert_error("{ ให้ y คือ 1; } แสดงผล(y);", "Undefined variable 'y'");
}

#[test]
fn uninitialized_variables_are_null() {
    assert_eq!(output_of("ให้ x; แสดงผล(x);"), "ว่าง");
}

#[test]
fn redeclaration_in_the_same_scope_fails() {
    assert_error("ให้ x คือ 1; ให้ x คือ 2;", "Variable 'x' is already declared in this scope");
}

#[test]
fn assignment_to_undeclared_variable_fails() {
    assert_error("x คือ 1;", "Undefined variable 'x'");
}

#[test]
fn assignment_is_an_expression() {
    assert_eq!(output_of("ให้ a คือ 0; ให้ b คือ 0; a คือ b คือ 7; แสดงผล(a, b);"), "77");
}

#[test]
fn constants_cannot_be_reassigned() {
    let result = run("ให้ x เป็น ค่าคงที่ คือ 5;\nx คือ 6;\nแสดงผล(\"never\");");
    assert_eq!(result.output, "");
    let error = result.result.expect_err("should fail");
    assert_eq!(error.message, "Cannot assign to constant 'x'");
    assert_eq!(error.span, Span::new(2, 3));

    assert_error("ให้ x เป็น ค่าคงที่ คือ 5; x++;", "Cannot assign to constant 'x'");
}

#[test]
fn constant_containers_remain_mutable() {
    assert_eq!(
        output_of("ให้ a เป็น ค่าคงที่ คือ [1]; a.เพิ่ม(2); a[0] คือ 9; แสดงผล(a);"),
        "[9, 2]"
    );
}

#[test]
fn containers_are_shared_and_strings_are_copied() {
    assert_eq!(output_of("ให้ a คือ [1]; ให้ b คือ a; b.เพิ่ม(2); แสดงผล(a);"), "[1, 2]");
    assert_eq!(
        output_of(r#"ให้ s คือ "ab"; ให้ t คือ s; t.เพิ่ม("c"); แสดงผล(s, " ", t);"#),
        "ab abc"
    );
}

#[test]
fn increment_and_decrement() {
    assert_eq!(
        output_of(r#"ให้ i คือ 5; แสดงผล(i++, " ", i, " ", ++i, " ", i--, " ", --i);"#),
        "5 6 7 7 5"
    );
    assert_eq!(output_of("ให้ a คือ [1]; a[0]++; แสดงผล(a);"), "[2]");
    assert_error("ให้ f คือ 1.5; f++;", "Cannot apply '++'");
}

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

#[test]
fn if_elif_else_chain() {
    let source = r#"
โปรแกรม classify(ให้ n) {
    ถ้า (n < 0) {
        คืนค่า "negative";
    } มิฉะนั้นถ้า (n = 0) {
        คืนค่า "zero";
    } มิฉะนั้น {
        คืนค่า "positive";
    }
}
แสดงผล(classify(-3), " ", classify(0), " ", classify(8));
"#;
    assert_eq!(output_of(source), "negative zero positive");
}

#[test]
fn conditions_must_be_boolean() {
    assert_error("ถ้า (1) { }", "Condition must be a boolean, found 1 (int)");
    assert_error("ขณะ (ว่าง) { }", "Condition must be a boolean");
}

#[test]
fn while_with_break_and_continue() {
    let source = "
ให้ i คือ 0;
ขณะ (i < 10) {
    i++;
    ถ้า (i = 3) { ไปยังรอบถัดไป; }
    ถ้า (i = 6) { ออกจากการทำซ้ำ; }
    แสดงผล(i);
}
";
    assert_eq!(output_of(source), "1245");
}

#[test]
fn for_loop_runs_update_after_continue() {
    let source = "
ทำซ้ำ (ตั้งแต่ ให้ i คือ 0 จนถึง i < 5 โดยแต่ละรอบ i++) {
    ถ้า (i = 1) { ไปยังรอบถัดไป; }
    แสดงผล(i);
}
";
    assert_eq!(output_of(source), "0234");
}

#[test]
fn for_loop_variable_is_scoped_to_the_loop() {
    assert_error(
        "ทำซ้ำ (ตั้งแต่ ให้ i คือ 0 จนถึง i < 2 โดยแต่ละรอบ i++) { } แสดงผล(i);",
        "Undefined variable 'i'",
    );
}

#[test]
fn for_loop_without_condition_needs_break() {
    let source = "
ให้ n คือ 0;
ทำซ้ำ (ตั้งแต่ จนถึง โดยแต่ละรอบ n++) {
    ถ้า (n = 3) { ออกจากการทำซ้ำ; }
}
แสดงผล(n);
";
    assert_eq!(output_of(source), "3");
}

#[test]
fn do_while_runs_at_least_once() {
    assert_eq!(
        output_of("ให้ n คือ 10; ทำ { แสดงผล(n); n++; } ขณะ (n < 5);"),
        "10"
    );
    assert_eq!(
        output_of("ให้ n คือ 0; ทำ { แสดงผล(n); n++; } ขณะ (n < 3)"),
        "012"
    );
}

#[test]
fn break_only_leaves_the_innermost_loop() {
    let source = r#"
ทำซ้ำ (ตั้งแต่ ให้ i คือ 0 จนถึง i < 3 โดยแต่ละรอบ i++) {
    ทำซ้ำ (ตั้งแต่ ให้ j คือ 0 จนถึง j < 3 โดยแต่ละรอบ j++) {
        ถ้า (j = 1) { ออกจากการทำซ้ำ; }
        แสดงผล(i, j, " ");
    }
}
"#;
    assert_eq!(output_of(source), "00 10 20 ");
}

#[test]
fn control_transfer_outside_its_construct() {
    assert_error("ออกจากการทำซ้ำ;", "used outside of a loop");
    assert_error("ไปยังรอบถัดไป;", "used outside of a loop");
    assert_error("คืนค่า 1;", "used outside of a function");
    assert_error("โปรแกรม f() { ออกจากการทำซ้ำ; } f();", "used outside of a loop");
}

#[test]
fn exit_stops_the_program_successfully() {
    let result = run(r#"แสดงผล("a"); จบการทำงาน; แสดงผล("b");"#);
    assert!(result.result.is_ok());
    assert_eq!(result.output, "a");

    let result = run("โปรแกรม stop() { จบการทำงาน; } แสดงผล(1); stop(); แสดงผล(2);");
    assert!(result.result.is_ok());
    assert_eq!(result.output, "1");
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

#[test]
fn recursive_function() {
    let source = "
โปรแกรม fact(ให้ n) {
    ถ้า (n <= 1) { คืนค่า 1; }
    คืนค่า n * fact(n - 1);
}
แสดงผล(fact(10));
";
    assert_eq!(output_of(source), "3628800");
}

#[test]
fn return_unwinds_nested_loops() {
    let source = r#"
โปรแกรม find(ให้ items, ให้ target) {
    ทำซ้ำ (ตั้งแต่ ให้ i คือ 0 จนถึง i < items.ขนาด() โดยแต่ละรอบ i++) {
        ขณะ (จริง) {
            ถ้า (items[i] = target) { คืนค่า i; }
            ออกจากการทำซ้ำ;
        }
    }
    คืนค่า -1;
}
แสดงผล(find([5, 7, 9], 9), " ", find([1], 4));
"#;
    assert_eq!(output_of(source), "2 -1");
}

#[test]
fn function_without_return_yields_null() {
    assert_eq!(output_of("โปรแกรม f() { } แสดงผล(f());"), "ว่าง");
}

#[test]
fn calling_a_function_before_its_declaration_fails() {
    assert_error("f(); โปรแกรม f() { }", "Undefined function 'f'");
}

#[test]
fn arity_mismatch() {
    assert_error(
        "โปรแกรม f(ให้ a) { } f();",
        "Function 'f' expects 1 argument(s) but got 0",
    );
}

#[test]
fn callee_sees_the_callers_variables() {
    let source = r#"
โปรแกรม inner() { แสดงผล(local); }
โปรแกรม outer() { ให้ local คือ "seen"; inner(); }
outer();
"#;
    assert_eq!(output_of(source), "seen");
}

#[test]
fn parameters_do_not_outlive_the_call() {
    assert_error("โปรแกรม f(ให้ p) { } f(1); แสดงผล(p);", "Undefined variable 'p'");
}

#[test]
fn arguments_are_passed_by_sharing() {
    assert_eq!(
        output_of("โปรแกรม fill(ให้ items) { items.เพิ่ม(1); } ให้ a คือ []; fill(a); fill(a); แสดงผล(a);"),
        "[1, 1]"
    );
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

#[test]
fn index_bounds_are_checked() {
    assert_error("ให้ a คือ [1, 2]; แสดงผล(a[2]);", "Index 2 is out of range for length 2");
    assert_error("ให้ a คือ [1, 2]; แสดงผล(a[-1]);", "must not be negative");
    assert_error("ให้ a คือ [1, 2]; แสดงผล(a[0.5]);", "must be a whole number");
    assert_eq!(output_of("ให้ a คือ [1, 2]; แสดงผล(a[1.0]);"), "2");
}

#[test]
fn pop_and_erase_on_empty_arrays() {
    assert_error("ให้ a คือ []; a.ดึงออก();", "Cannot pop from an empty array");
    assert_error("ให้ a คือ []; a.ลบ(0);", "Cannot erase from an empty array");
}

#[test]
fn insert_accepts_the_end_position() {
    assert_eq!(
        output_of("ให้ a คือ [1, 2]; a.แทรก(2, 3); a.แทรก(0, 0); แสดงผล(a);"),
        "[0, 1, 2, 3]"
    );
    assert_error(
        "ให้ a คือ [1, 2]; a.แทรก(5, 3);",
        "Insert position 5 is out of range for length 2",
    );
}

#[test]
fn erase_and_pop_return_the_removed_element() {
    assert_eq!(
        output_of(r#"ให้ a คือ [1, 2, 3]; แสดงผล(a.ลบ(1), " ", a, " ", a.ดึงออก(), " ", a.ขนาด());"#),
        "2 [1, 3] 3 1"
    );
}

#[test]
fn strings_are_indexed_by_character() {
    assert_eq!(output_of(r#"ให้ s คือ "สวัสดี"; แสดงผล(s.ขนาด(), " ", s[0]);"#), "6 ส");
}

#[test]
fn string_methods_write_back_to_the_variable() {
    assert_eq!(
        output_of(r#"ให้ s คือ "abc"; s.เพิ่ม("d"); s.แทรก(0, "_"); แสดงผล(s.ลบ(1), " ", s.ดึงออก(), " ", s);"#),
        "a d _bc"
    );
}

#[test]
fn object_members_and_keys() {
    let source = r#"
ให้ o คือ {"name": "mmt", "n": 1};
o.n คือ o.n + 1;
o["new"] คือ จริง;
แสดงผล(o.name, " ", o["n"], " ", o.ขนาด(), " ", o);
"#;
    assert_eq!(output_of(source), r#"mmt 2 3 {"n": 2, "name": "mmt", "new": จริง}"#);
}

#[test]
fn missing_members_are_errors() {
    assert_error(r#"ให้ o คือ {"a": 1}; แสดงผล(o.missing);"#, "Object has no member 'missing'");
    assert_error("ให้ n คือ 1; แสดงผล(n.value);", "Cannot read member 'value'");
}

#[test]
fn nested_containers() {
    assert_eq!(
        output_of(r#"ให้ m คือ {"rows": [[1, 2], [3, 4]]}; m.rows[1][0] คือ 30; แสดงผล(m.rows[1], m.rows.ขนาด());"#),
        "[30, 4]2"
    );
}

#[test]
fn step_targets_are_evaluated_once() {
    assert_eq!(
        output_of(r#"ให้ a คือ [10, 20, 30]; ให้ i คือ 0; a[i++]++; แสดงผล(a, " ", i);"#),
        "[11, 20, 30] 1"
    );
    assert_eq!(
        output_of(r#"ให้ o คือ {"n": 1}; ให้ k คือ ["n"]; ++o[k.ดึงออก()]; แสดงผล(o, " ", k.ขนาด());"#),
        r#"{"n": 2} 0"#
    );
}

#[test]
fn string_edits_write_back_to_the_element_they_came_from() {
    let source = r#"
ให้ words คือ ["ab", "cd"];
ให้ i คือ 0;
words[i++].เพิ่ม("!");
แสดงผล(words, " ", i);
"#;
    assert_eq!(output_of(source), "[ab!, cd] 1");
}

#[test]
fn self_containing_containers_print_and_compare() {
    assert_eq!(output_of("ให้ a คือ []; a.เพิ่ม(a); แสดงผล(a);"), "[[...]]");
    assert_eq!(
        output_of(r#"ให้ o คือ {"n": 1}; o.self คือ o; แสดงผล(o);"#),
        r#"{"n": 1, "self": {...}}"#
    );
    assert_eq!(
        output_of("ให้ a คือ []; a.เพิ่ม(a); ให้ b คือ []; b.เพิ่ม(b); แสดงผล(a = b);"),
        "จริง"
    );
}

#[test]
fn shared_containers_are_not_mistaken_for_cycles() {
    assert_eq!(output_of("ให้ a คือ [1]; แสดงผล([a, a]);"), "[[1], [1]]");
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[test]
fn input_reads_one_line_without_the_terminator() {
    let result = run_program(
        r#"ให้ name คือ ""; รับข้อมูล name; แสดงผล("สวัสดี ", name, "!");"#,
        "Somchai\r\nrest\n",
        MemoryLoader::new(),
    );
    assert!(result.result.is_ok());
    assert_eq!(result.output, "สวัสดี Somchai!");
}

#[test]
fn input_at_end_of_stream_is_empty() {
    let result = run_program("ให้ v; รับข้อมูล v; แสดงผล(v.ขนาด());", "", MemoryLoader::new());
    assert!(result.result.is_ok());
    assert_eq!(result.output, "0");
}

#[test]
fn input_requires_a_declared_variable() {
    let result = run_program("รับข้อมูล nothing;", "x\n", MemoryLoader::new());
    let error = result.result.expect_err("should fail");
    assert!(error.message.contains("Undefined variable 'nothing'"));
}

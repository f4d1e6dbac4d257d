use std::io::Write;

use assert_cmd::Command;
use indoc::indoc;
use tempfile::NamedTempFile;

fn run(source: &str) -> (String, String, i32) {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    write!(file, "{source}").expect("failed to write source");

    let mut cmd = Command::cargo_bin("interp").expect("binary not found");
    cmd.arg(file.path());
    let output = cmd.output().expect("failed to run binary");

    (
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn prints_hello_world() {
    let (stdout, _stderr, code) = run(r#"print "hello, world!";"#);
    assert_eq!(stdout, "\"hello, world!\"\n");
    assert_eq!(code, 0);
}

#[test]
fn arithmetic_and_comparison() {
    let (stdout, _stderr, code) = run(indoc! {r#"
        print 1 + 2 * 3;
        print (1 + 2) * 3;
        print 10 / 4;
        print 3 < 4;
        print 3 >= 4;
    "#});
    assert_eq!(stdout, "7\n9\n2.5\ntrue\nfalse\n");
    assert_eq!(code, 0);
}

#[test]
fn closures_capture_their_defining_environment() {
    let (stdout, _stderr, code) = run(indoc! {r#"
        fun makeCounter() {
          var count = 0;
          fun counter() {
            count = count + 1;
            return count;
          }
          return counter;
        }
        var counter = makeCounter();
        print counter();
        print counter();
    "#});
    assert_eq!(stdout, "1\n2\n");
    assert_eq!(code, 0);
}

#[test]
fn closures_see_later_assignments_to_outer_variables() {
    let (stdout, _stderr, code) = run(indoc! {r#"
        var a = "outer";
        fun showA() {
          print a;
        }
        showA();
        a = "changed";
        showA();
    "#});
    assert_eq!(stdout, "\"outer\"\n\"changed\"\n");
    assert_eq!(code, 0);
}

#[test]
fn classes_support_init_fields_and_methods() {
    let (stdout, _stderr, code) = run(indoc! {r#"
        class Cake {
          init(flavor) {
            this.flavor = flavor;
          }
          describe() {
            return "a " + this.flavor + " cake";
          }
        }
        var cake = Cake("chocolate");
        print cake.describe();
    "#});
    assert_eq!(stdout, "\"a chocolate cake\"\n");
    assert_eq!(code, 0);
}

#[test]
fn init_always_returns_this_even_with_a_bare_return() {
    let (stdout, _stderr, code) = run(indoc! {r#"
        class Thing {
          init() {
            return;
          }
        }
        print Thing();
    "#});
    assert_eq!(stdout, "<instance of <class: Thing>>\n");
    assert_eq!(code, 0);
}

#[test]
fn super_dispatches_to_the_parent_methods() {
    let (stdout, _stderr, code) = run(indoc! {r#"
        class Doughnut {
          cook() {
            print "Fry until golden brown.";
          }
        }
        class BostonCream < Doughnut {
          cook() {
            super.cook();
            print "Pipe full of custard and coat with chocolate.";
          }
        }
        BostonCream().cook();
    "#});
    assert_eq!(
        stdout,
        "\"Fry until golden brown.\"\n\"Pipe full of custard and coat with chocolate.\"\n"
    );
    assert_eq!(code, 0);
}

#[test]
fn logical_operators_return_an_operand_not_a_bool() {
    let (stdout, _stderr, code) = run(indoc! {r#"
        print "hi" or 2;
        print nil or "yes";
        print nil and "unreached";
    "#});
    assert_eq!(stdout, "\"hi\"\n\"yes\"\n<nil>\n");
    assert_eq!(code, 0);
}

#[test]
fn adding_a_string_to_a_number_is_a_runtime_error() {
    let (_stdout, stderr, code) = run(r#"print "four" + 4;"#);
    assert!(stderr.contains("operands must be two numbers or two strings"));
    assert_eq!(code, 70);
}

#[test]
fn calling_a_non_callable_value_is_a_runtime_error() {
    let (_stdout, stderr, code) = run(r#"var x = 4; x();"#);
    assert!(stderr.contains("can only call functions and classes"));
    assert_eq!(code, 70);
}

#[test]
fn using_an_undeclared_local_in_its_own_initializer_is_a_static_error() {
    let (_stdout, stderr, code) = run(indoc! {r#"
        var a = "outer";
        {
          var a = a;
        }
    "#});
    assert!(stderr.contains("can't read local variable in its own initializer"));
    assert_eq!(code, 65);
}

#[test]
fn unterminated_string_is_reported_and_does_not_run() {
    let (stdout, stderr, code) = run("print \"unterminated;");
    assert_eq!(stdout, "");
    assert!(!stderr.is_empty());
    assert_eq!(code, 65);
}

// Integration tests for the bytecode compiler + VM pipeline.
//
// Each test spawns the built `izi` binary against a temp script and
// asserts exact stdout, matching the end-to-end scenarios that drive
// the compiler/VM's observable behavior.

use std::io::Write;
use std::process::Command;

fn run_script(source: &str) -> String {
    let mut file = tempfile();
    write!(file.1, "{}", source).unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_izi"))
        .arg("run")
        .arg(file.0.path())
        .output()
        .expect("failed to spawn izi binary");
    assert!(
        output.status.success(),
        "izi run exited with {:?}, stderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

// A minimal `NamedTempFile`-less temp file: write into a file in
// std::env::temp_dir named after the current thread + a counter, since
// the crate does not depend on `tempfile`.
fn tempfile() -> (TempPath, std::fs::File) {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!("izi_test_{}_{}.izi", std::process::id(), n));
    let file = std::fs::File::create(&path).unwrap();
    (TempPath(path), file)
}

struct TempPath(std::path::PathBuf);
impl TempPath {
    fn path(&self) -> &std::path::Path {
        &self.0
    }
}
impl Drop for TempPath {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[test]
fn arithmetic_and_print() {
    assert_eq!(run_script("print(2 + 3 * 4);"), "14\n");
}

#[test]
fn globals_and_control_flow() {
    let source = "var n = 0;\nwhile (n < 3) { print(n); n = n + 1; }\n";
    assert_eq!(run_script(source), "0\n1\n2\n");
}

#[test]
fn user_functions_return_values() {
    let source = "fn add(a, b) { return a + b; }\nprint(add(2, 40));\n";
    assert_eq!(run_script(source), "42\n");
}

#[test]
fn try_catch_with_thrown_string() {
    let source = "try { throw \"boom\"; } catch (e) { print(e); }\n";
    assert_eq!(run_script(source), "boom\n");
}

#[test]
fn classes_and_methods() {
    let source = r#"
class Counter {
  var count;
  fn constructor(start) { this.count = start; }
  fn inc() { this.count = this.count + 1; return this.count; }
}
var c = Counter(10);
print(c.inc());
print(c.inc());
"#;
    assert_eq!(run_script(source), "11\n12\n");
}

#[test]
fn tree_walking_interpreter_agrees_with_the_bytecode_vm() {
    let mut file = tempfile();
    write!(file.1, "fn add(a, b) {{ return a + b; }}\nprint(add(2, 40));\n").unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_izi"))
        .arg("run")
        .arg("--interpreter")
        .arg(file.0.path())
        .output()
        .expect("failed to spawn izi binary");
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "42\n");
}

#[test]
fn script_arguments_are_visible_to_process_args() {
    let mut file = tempfile();
    write!(file.1, "print(process.args());\n").unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_izi"))
        .arg("run")
        .arg(file.0.path())
        .arg("--")
        .arg("alpha")
        .arg("beta")
        .output()
        .expect("failed to spawn izi binary");
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "[alpha, beta]\n");
}

#[test]
fn deep_recursion_raises_a_stack_overflow_host_error() {
    let source = "fn recurse(n) { return recurse(n + 1); }\nrecurse(0);\n";
    let mut file = tempfile();
    write!(file.1, "{}", source).unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_izi"))
        .arg("run")
        .arg(file.0.path())
        .output()
        .expect("failed to spawn izi binary");
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.to_lowercase().contains("stack overflow"), "stderr was: {}", stderr);
}

#[test]
fn native_module_member_access_works_end_to_end() {
    let source = "print(math.sqrt(16));\nprint(string.upper(\"hi\"));\nprint(array.len([1, 2, 3]));\n";
    assert_eq!(run_script(source), "4\nHI\n3\n");
}

#[test]
fn subclasses_inherit_and_override_methods_via_super() {
    let source = r#"
class Animal {
  fn constructor(name) { this.name = name; }
  fn speak() { return this.name + " makes a sound"; }
}
class Dog < Animal {
  fn speak() { return super.speak() + ", specifically a bark"; }
}
var d = Dog("Rex");
print(d.speak());
"#;
    assert_eq!(run_script(source), "Rex makes a sound, specifically a bark\n");
}

#[test]
fn unimplemented_stub_modules_raise_a_type_error() {
    let mut file = tempfile();
    write!(file.1, "ui.open_window();\n").unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_izi"))
        .arg("run")
        .arg(file.0.path())
        .output()
        .expect("failed to spawn izi binary");
    assert!(!output.status.success());
}

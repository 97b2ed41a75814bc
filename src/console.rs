use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    tty::IsTty,
};
use std::io::{self, BufRead, Write};

use crate::models::Grade;
use crate::session::Interaction;

/// Line-oriented terminal prompts.
pub struct Console<R: BufRead, W: Write> {
    input: R,
    output: W,
    color: bool,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        let color = io::stdout().is_tty();
        Console::new(io::stdin().lock(), io::stdout(), color)
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W, color: bool) -> Self {
        Self {
            input,
            output,
            color,
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    fn print_colored(&mut self, text: &str, color: Color) -> io::Result<()> {
        if self.color {
            queue!(self.output, SetForegroundColor(color), Print(text), ResetColor)?;
        } else {
            self.output.write_all(text.as_bytes())?;
        }
        Ok(())
    }

    fn line(&mut self, text: &str, color: Color) -> io::Result<()> {
        self.print_colored(text, color)?;
        writeln!(self.output)?;
        self.output.flush()
    }

    fn warn(&mut self, text: &str) -> io::Result<()> {
        self.line(text, Color::Yellow)
    }

    /// Print `prompt` and read one line, without the trailing newline.
    pub fn ask(&mut self, prompt: &str) -> io::Result<String> {
        self.print_colored(prompt, Color::Cyan)?;
        write!(self.output, " ")?;
        self.output.flush()?;

        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for an answer",
            ));
        }
        Ok(buf.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead, W: Write> Interaction for Console<R, W> {
    fn show(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)?;
        self.output.flush()
    }

    fn display_card(&mut self, front: &str, phonetic: &str, meaning: &str) -> io::Result<()> {
        writeln!(self.output)?;
        self.print_colored("Word: ", Color::DarkGrey)?;
        self.line(front, Color::White)?;
        self.ask("Transliteration? (press Enter to continue)...")?;

        self.print_colored("Transliteration: ", Color::DarkGrey)?;
        self.line(phonetic, Color::White)?;

        let answer = self.ask("What is the translation?")?;
        self.print_colored("Correct: ", Color::DarkGrey)?;
        self.line(meaning, Color::Green)?;
        self.print_colored("Your Answer: ", Color::DarkGrey)?;
        self.line(answer.trim(), Color::White)
    }

    fn request_grade(&mut self) -> io::Result<Grade> {
        loop {
            let raw = self.ask("Rate recall (0=forgot, 4=perfect):")?;
            match raw.trim().parse::<i64>() {
                Ok(_) => match Grade::parse(&raw) {
                    Some(grade) => return Ok(grade),
                    None => self.warn("Enter a number between 0 and 4.")?,
                },
                Err(_) => self.warn("Enter a valid number.")?,
            }
        }
    }

    fn request_yes_no(&mut self, prompt: &str) -> io::Result<bool> {
        loop {
            let raw = self.ask(&format!("{} (Y/N)", prompt))?;
            match raw.trim().to_uppercase().as_str() {
                "Y" | "YES" => return Ok(true),
                "N" | "NO" => return Ok(false),
                _ => self.warn("Input Y or N to continue")?,
            }
        }
    }

    fn request_choice(&mut self, prompt: &str, options: &[&str]) -> io::Result<usize> {
        loop {
            self.line(prompt, Color::Cyan)?;
            for (i, option) in options.iter().enumerate() {
                writeln!(self.output, "  {}) {}", i + 1, option)?;
            }
            let raw = self.ask(&format!("Enter choice (1-{}):", options.len()))?;
            match raw.trim().parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => self.warn(&format!("Enter a number from 1 to {}.", options.len()))?,
            }
        }
    }

    fn request_integer(&mut self, prompt: &str, minimum: u32) -> io::Result<u32> {
        loop {
            let raw = self.ask(prompt)?;
            match raw.trim().parse::<u32>() {
                Ok(n) if n >= minimum => return Ok(n),
                _ => self.warn(&format!("Please enter a whole number of at least {}.", minimum))?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), false)
    }

    fn output(c: Console<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(c.into_output()).unwrap()
    }

    mod grade_tests {
        use super::*;

        #[test]
        fn reprompts_until_grade_in_range() {
            let mut c = console("abc\n7\n-1\n3\n");
            assert_eq!(c.request_grade().unwrap().value(), 3);
            let out = output(c);
            assert_eq!(out.matches("Enter a valid number.").count(), 1);
            assert_eq!(out.matches("Enter a number between 0 and 4.").count(), 2);
        }

        #[test]
        fn accepts_surrounding_whitespace() {
            let mut c = console("  0 \r\n");
            assert_eq!(c.request_grade().unwrap().value(), 0);
        }

        #[test]
        fn eof_is_an_error() {
            let mut c = console("x\n");
            let err = c.request_grade().unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        }
    }

    mod yes_no_tests {
        use super::*;

        #[test]
        fn case_insensitive_answers() {
            let mut c = console("y\nN\nYes\n");
            assert!(c.request_yes_no("Continue?").unwrap());
            assert!(!c.request_yes_no("Continue?").unwrap());
            assert!(c.request_yes_no("Continue?").unwrap());
        }

        #[test]
        fn reprompts_on_other_input() {
            let mut c = console("maybe\n\nn\n");
            assert!(!c.request_yes_no("Continue?").unwrap());
            assert_eq!(output(c).matches("Input Y or N").count(), 2);
        }
    }

    mod choice_tests {
        use super::*;

        #[test]
        fn returns_zero_based_index() {
            let mut c = console("2\n");
            assert_eq!(c.request_choice("Pick", &["a", "b"]).unwrap(), 1);
        }

        #[test]
        fn rejects_out_of_range_and_text() {
            let mut c = console("0\n3\ntwo\n1\n");
            assert_eq!(c.request_choice("Pick", &["a", "b"]).unwrap(), 0);
            let out = output(c);
            assert_eq!(out.matches("Enter a number from 1 to 2.").count(), 3);
            assert!(out.contains("  1) a"));
        }
    }

    mod integer_tests {
        use super::*;

        #[test]
        fn enforces_minimum() {
            let mut c = console("0\n-4\nten\n12\n");
            assert_eq!(c.request_integer("How many?", 1).unwrap(), 12);
        }
    }

    mod display_tests {
        use super::*;

        #[test]
        fn display_card_reveals_in_stages() {
            let mut c = console("\nhouse\n");
            c.display_card("بيت", "bayt", "house").unwrap();
            let out = output(c);

            let front = out.find("بيت").unwrap();
            let phonetic = out.find("Transliteration: bayt").unwrap();
            let meaning = out.find("Correct: house").unwrap();
            assert!(front < phonetic && phonetic < meaning);
            assert!(out.contains("Your Answer: house"));
        }

        #[test]
        fn plain_output_has_no_escape_codes() {
            let mut c = console("");
            c.show("hello").unwrap();
            assert_eq!(output(c), "hello\n");
        }
    }
}

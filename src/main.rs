use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::{debug, info};

use aoc2021::bits::Packet;
use aoc2021::error;
use aoc2021::snailfish::{add_list, max_pairwise_magnitude};

type Solver = fn(u8, &str) -> error::Result<String>;

/// Non-blank lines with surrounding whitespace removed.
fn puzzle_lines(input: &str) -> impl Iterator<Item = &str> {
    input.lines().map(str::trim).filter(|line| !line.is_empty())
}

fn day16(part: u8, input: &str) -> error::Result<String> {
    let hex = puzzle_lines(input).collect::<String>();
    let packet = Packet::from_hex(&hex)?;
    debug!("packet tree:\n{}", packet);
    if part == 1 {
        Ok(packet.version_sum().to_string())
    } else {
        Ok(packet.evaluate()?.to_string())
    }
}

fn day18(part: u8, input: &str) -> error::Result<String> {
    let lines = puzzle_lines(input).collect::<Vec<_>>();
    if part == 1 {
        let sum = add_list(lines.iter().copied())?;
        debug!(%sum, "final sum");
        Ok(sum.magnitude()?.to_string())
    } else {
        Ok(max_pairwise_magnitude(&lines)?.to_string())
    }
}

fn solver(day: u8) -> Option<Solver> {
    match day {
        16 => Some(day16 as Solver),
        18 => Some(day18 as Solver),
        _ => None
    }
}

#[derive(Parser, Debug)]
#[command(about = "Packet decoder (day 16) and snailfish arithmetic (day 18)")]
struct Cli {
    /// Puzzle day: 16 or 18
    day: u8,
    /// Puzzle part
    #[arg(value_parser = clap::value_parser!(u8).range(1 ..= 2))]
    part: u8,
    /// Read day<DAY>test<N>.in instead of day<DAY>.in
    #[arg(long, value_name = "N")]
    test: Option<u32>,
    /// Read this file instead of the default input name
    #[arg(long, value_name = "PATH", conflicts_with = "test")]
    input: Option<PathBuf>,
}

impl Cli {
    fn input_path(&self) -> PathBuf {
        match (&self.input, self.test) {
            (Some(path), _) => path.clone(),
            (None, Some(test)) => format!("day{}test{}.in", self.day, test).into(),
            (None, None) => format!("day{}.in", self.day).into(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let solve = solver(cli.day).ok_or_else(|| anyhow!("no solution for day {}", cli.day))?;
    let path = cli.input_path();
    info!(file = %path.display(), "reading input");
    let input = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;

    let time = std::time::Instant::now();
    let answer = solve(cli.part, &input)
        .with_context(|| format!("day {} part {} failed", cli.day, cli.part))?;
    println!("{}", answer);
    info!(seconds = time.elapsed().as_secs_f32(), "elapsed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    use aoc2021::error::Error;

    #[test]
    fn day16_joins_lines() {
        let input = indoc! {"
            9C0141080250
            320F1802104A08

        "};
        assert_eq!(day16(1, input).unwrap(), "20");
        assert_eq!(day16(2, input).unwrap(), "1");
        assert_eq!(day16(1, "A0016C880162017C3686B18A3D4780\n").unwrap(), "31");
    }

    #[test]
    fn day16_reports_bad_digits() {
        assert_eq!(day16(1, "C200B40A8Z").unwrap_err(),
                   Error::InvalidHexDigit { digit: 'Z', offset: 9 });
    }

    #[test]
    fn day18_homework() {
        let input = indoc! {"
            [[[0,[5,8]],[[1,7],[9,6]]],[[4,[1,2]],[[1,4],2]]]
            [[[5,[2,8]],4],[5,[[9,9],0]]]
            [6,[[[6,2],[5,6]],[[7,6],[4,7]]]]
            [[[6,[0,7]],[0,9]],[4,[9,[9,0]]]]
            [[[7,[6,4]],[3,[1,3]]],[[[5,5],1],9]]

            [[6,[[7,3],[3,2]]],[[[3,8],[5,7]],4]]
            [[[[5,4],[7,7]],8],[[8,3],8]]
            [[9,3],[[9,9],[6,[4,9]]]]
            [[2,[[7,7],7]],[[5,8],[[9,3],[0,2]]]]
            [[[[5,2],5],[8,[3,7]]],[[5,[7,5]],[4,4]]]
        "};
        assert_eq!(day18(1, input).unwrap(), "4140");
        assert_eq!(day18(2, input).unwrap(), "3993");
    }

    #[test]
    fn day18_needs_numbers() {
        assert_eq!(day18(1, "\n\n").unwrap_err(), Error::NotEnoughNumbers { count: 0 });
        assert_eq!(day18(2, "[1,2]\n").unwrap_err(), Error::NotEnoughNumbers { count: 1 });
    }

    #[test]
    fn dispatch_and_paths() {
        assert!(solver(16).is_some());
        assert!(solver(18).is_some());
        assert!(solver(17).is_none());

        let cli = Cli::try_parse_from(["aoc2021", "18", "2", "--test", "3"]).unwrap();
        assert_eq!(cli.input_path(), PathBuf::from("day18test3.in"));
        let cli = Cli::try_parse_from(["aoc2021", "16", "1"]).unwrap();
        assert_eq!(cli.input_path(), PathBuf::from("day16.in"));
        let cli = Cli::try_parse_from(["aoc2021", "16", "1", "--input", "packets.txt"]).unwrap();
        assert_eq!(cli.input_path(), PathBuf::from("packets.txt"));
        assert!(Cli::try_parse_from(["aoc2021", "16", "3"]).is_err());
    }
}

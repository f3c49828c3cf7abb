use anyhow::{Context, Result};
use std::time::Duration;

use pingrs::wire::{DEFAULT_PAYLOAD_LEN, MAX_ECHO_PAYLOAD};

const USAGE: &str = "Uso: pingrs <host> [-c <count>] [-i <intervalo>] [-s <tamanho>] [-W <timeout>]";

#[derive(Debug, PartialEq)]
pub struct PingArgs {
    pub host: String,
    pub count: Option<u64>,
    pub interval: Duration,
    pub payload_size: usize,
    pub timeout: Duration,
}

/// Lê os argumentos da linha de comando (sem o nome do programa).
pub fn parse() -> Result<PingArgs> {
    parse_from(std::env::args().skip(1))
}

fn parse_from<I>(args: I) -> Result<PingArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();

    // Padrões: infinito, 1s entre pings, 56 bytes, 2s de espera
    let mut host = None;
    let mut count = None;
    let mut interval = Duration::from_secs(1);
    let mut payload_size = DEFAULT_PAYLOAD_LEN;
    let mut timeout = Duration::from_secs(2);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" => {
                let value = args.next().context("Faltou o valor para -c")?;
                let c: u64 = value.parse().context("Valor inválido para -c")?;
                count = Some(c);
            }
            "-i" => interval = seconds(args.next(), "-i")?,
            "-W" => timeout = seconds(args.next(), "-W")?,
            "-s" => {
                let value = args.next().context("Faltou o valor para -s")?;
                payload_size = value.parse().context("Valor inválido para -s")?;
                if payload_size > MAX_ECHO_PAYLOAD {
                    // Tem que caber num datagrama IPv4
                    anyhow::bail!("Tamanho {} excede o máximo de {}", payload_size, MAX_ECHO_PAYLOAD);
                }
            }
            flag if flag.starts_with('-') => anyhow::bail!("Opção desconhecida {}\n{}", flag, USAGE),
            // Primeiro argumento livre é o destino
            value => {
                if host.is_none() {
                    host = Some(value.to_owned());
                }
            }
        }
    }

    let host = host.context(USAGE)?;
    Ok(PingArgs {
        host,
        count,
        interval,
        payload_size,
        timeout,
    })
}

/// Valor em segundos, aceita frações (ex.: 0.5).
fn seconds(value: Option<String>, flag: &str) -> Result<Duration> {
    let value = value.with_context(|| format!("Faltou o valor para {}", flag))?;
    let secs: f64 = value
        .parse()
        .with_context(|| format!("Valor inválido para {}", flag))?;
    Duration::try_from_secs_f64(secs).with_context(|| format!("Valor inválido para {}", flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_strs(args: &[&str]) -> Result<PingArgs> {
        parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_defaults() {
        let args = parse_strs(&["10.0.0.1"]).unwrap();
        assert_eq!(args.host, "10.0.0.1");
        assert_eq!(args.count, None);
        assert_eq!(args.interval, Duration::from_secs(1));
        assert_eq!(args.payload_size, 56);
        assert_eq!(args.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_all_options() {
        let args = parse_strs(&["-c", "3", "example.com", "-i", "0.5", "-s", "100", "-W", "4"])
            .unwrap();
        assert_eq!(args.host, "example.com");
        assert_eq!(args.count, Some(3));
        assert_eq!(args.interval, Duration::from_millis(500));
        assert_eq!(args.payload_size, 100);
        assert_eq!(args.timeout, Duration::from_secs(4));
    }

    #[test]
    fn test_errors() {
        assert!(parse_strs(&[]).is_err());
        assert!(parse_strs(&["host", "-c"]).is_err());
        assert!(parse_strs(&["host", "-c", "x"]).is_err());
        assert!(parse_strs(&["host", "-i", "-1"]).is_err());
        assert!(parse_strs(&["host", "-s", "70000"]).is_err());
        assert!(parse_strs(&["host", "-x"]).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = parse_strs(&["host", "-c"]).unwrap_err();
        assert_eq!(err.to_string(), "Faltou o valor para -c");
        let err = parse_strs(&[]).unwrap_err();
        assert!(err.to_string().starts_with("Uso: pingrs"));
    }
}

// Tratamento de erros ergonômico
use anyhow::{Context, Result};

// Observador compartilhado com a sessão (referência fraca do lado dela)
use std::rc::Rc;

// Flag de interrupção compartilhada com o handler de Ctrl+C
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// Canal por onde a sessão entrega os eventos
use std::sync::mpsc::{self, Receiver};

// Medição de tempo (RTT e timeouts)
use std::time::{Duration, Instant};

use pingrs::{Framing, IncomingPacket, PingEvent, PingSession};

// Módulos locais
mod args;

/// Espera máxima por vez no socket, para o Ctrl+C ser notado rápido.
const POLL_SLICE: Duration = Duration::from_millis(100);

/// Programa principal: envia Echo Requests e aguarda cada Echo Reply.
/// Timeouts e estatísticas ficam aqui, em cima dos eventos da sessão.
fn main() -> Result<()> {
    // Logs da biblioteca (RUST_LOG=debug para ver mais)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Parsing de argumentos via módulo args
    let args = args::parse()?;

    // Configura handler para Ctrl+C
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Erro ao configurar handler de Ctrl+C")?;

    // Resolve o host e cria a sessão (identificador aleatório, nunca zero)
    let mut session = PingSession::with_host_name(&args.host)
        .with_context(|| format!("Não foi possível resolver {}", args.host))?;

    // Os eventos chegam por um canal; a sessão só guarda uma referência fraca
    let (tx, rx) = mpsc::channel::<PingEvent>();
    let observer = Rc::new(tx);
    session.set_observer(&observer);

    // Abre o socket: RAW se houver privilégio, senão ICMP datagrama
    session.start();
    match rx.try_recv() {
        Ok(PingEvent::Started { target, identifier }) => println!(
            "Disparando {} [{}] com {} bytes de dados (id {:#06x}):",
            args.host, target, args.payload_size, identifier
        ),
        Ok(PingEvent::Failed(e)) => {
            return Err(e).context(
                "Falha ao criar socket ICMP. Verifique se está rodando como Administrador/root.",
            );
        }
        other => anyhow::bail!("A sessão não iniciou: {:?}", other),
    }

    // Payload enviado dentro de cada pacote ICMP
    let payload = vec![0u8; args.payload_size];

    // Estatísticas
    let mut stats = Statistics::default();

    while running.load(Ordering::SeqCst) {
        // Verifica limite de contagem se houver
        if args.count.is_some_and(|limit| stats.transmitted >= limit) {
            break;
        }

        // Marca o instante do envio para calcular o RTT depois
        let sequence = session.next_sequence_number();
        let t0 = Instant::now();

        // Envia o Echo Request e conta como transmitido (tentativa)
        session.send(Some(payload.as_slice()));
        stats.transmitted += 1;

        // O resultado do envio chega como evento
        let mut sent = false;
        for event in rx.try_iter() {
            match event {
                PingEvent::PacketSent { .. } => sent = true,
                PingEvent::SendFailed { error, .. } => println!("Falha ao enviar: {}", error),
                _ => {}
            }
        }

        // Se falhou ao enviar, não aguardamos resposta, mas conta como perda
        if sent {
            let deadline = t0 + args.timeout;
            loop {
                let now = Instant::now();
                if now >= deadline {
                    println!("Esgotado o tempo limite do pedido (icmp_seq={}).", sequence);
                    break;
                }

                // Verifica interrupção também no loop de espera
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                // Aguarda o socket em fatias curtas e trata um datagrama
                session.poll(Some((deadline - now).min(POLL_SLICE)));
                if let Some(rtt) = await_reply(&rx, sequence, t0)? {
                    stats.record(rtt);
                    break;
                }
            }
        }

        // Se tiver limite, não dorme depois do último
        if args.count.is_some_and(|limit| stats.transmitted >= limit) {
            break;
        }

        // Verifica interrupção antes do sleep
        if running.load(Ordering::SeqCst) {
            std::thread::sleep(args.interval);
        }
    }

    // Fecha o socket e exibe estatísticas ao sair
    session.stop();
    stats.print(&args.host);
    Ok(())
}

/// Esvazia os eventos pendentes e imprime a resposta a `sequence`, se chegou.
fn await_reply(rx: &Receiver<PingEvent>, sequence: u16, t0: Instant) -> Result<Option<f64>> {
    let mut rtt = None;
    for event in rx.try_iter() {
        match event {
            PingEvent::ReplyReceived(raw) => {
                // Socket datagrama pode entregar sem o cabeçalho IP
                let Ok(reply) = IncomingPacket::decode_framed(&raw, Framing::Detect) else {
                    continue;
                };

                // Respostas atrasadas de pedidos anteriores são ignoradas
                if reply.sequence != sequence {
                    log::debug!("Ignorando resposta para icmp_seq {}", reply.sequence);
                    continue;
                }

                let rtt_ms = t0.elapsed().as_secs_f64() * 1000.0;
                match reply.ip_header() {
                    Some(ip) => println!(
                        "Resposta de {}: bytes={} icmp_seq={} ttl={} tempo={:.2}ms",
                        ip.source,
                        reply.icmp().len(),
                        reply.sequence,
                        ip.ttl,
                        rtt_ms
                    ),
                    None => println!(
                        "Resposta: bytes={} icmp_seq={} tempo={:.2}ms",
                        reply.icmp().len(),
                        reply.sequence,
                        rtt_ms
                    ),
                }
                rtt = Some(rtt_ms);
            }
            PingEvent::Failed(e) => return Err(e).context("Erro na leitura"),
            _ => {}
        }
    }
    Ok(rtt)
}

#[derive(Default)]
struct Statistics {
    transmitted: u64,
    rtts: Vec<f64>,
}

impl Statistics {
    fn record(&mut self, rtt_ms: f64) {
        self.rtts.push(rtt_ms);
    }

    fn print(&self, host: &str) {
        let received = self.rtts.len() as u64;
        println!("\n--- estatísticas de ping para {} ---", host);
        let loss = if self.transmitted > 0 {
            (self.transmitted - received) as f64 / self.transmitted as f64 * 100.0
        } else {
            0.0
        };
        println!(
            "{} pacotes transmitidos, {} recebidos, {:.0}% de perda de pacotes",
            self.transmitted, received, loss
        );

        if !self.rtts.is_empty() {
            let min = self.rtts.iter().fold(f64::INFINITY, |a, &b| a.min(b));
            let max = self.rtts.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
            let avg = self.rtts.iter().sum::<f64>() / self.rtts.len() as f64;
            println!("rtt min/avg/max = {:.3}/{:.3}/{:.3} ms", min, avg, max);
        }
    }
}

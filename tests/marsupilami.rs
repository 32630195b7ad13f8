// MarsupilamiFourteen checked against a standalone tree evaluation that shares no
// code with the crate: its own sponge on `keccak::p1600`, its own padding, encoding
// and constants. The standalone sponge is pinned to SHAKE256 and its tree to the
// RFC 9861 KangarooTwelve vectors before it is trusted with 14 rounds.

use once_cell::sync::Lazy;
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256,
};

use treehash::kangaroo;

const CHUNK: usize = 8192;

#[derive(Clone, Copy)]
struct Tree {
    rounds: usize,
    rate: usize,
    cv_len: usize,
}

const KANGAROO_TWELVE: Tree = Tree {
    rounds: 12,
    rate: 168,
    cv_len: 32,
};

const MARSUPILAMI_FOURTEEN: Tree = Tree {
    rounds: 14,
    rate: 136,
    cv_len: 64,
};

fn ptn(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

static PTN_83521: Lazy<Vec<u8>> = Lazy::new(|| ptn(17 * 17 * 17 * 17));

// materializes the whole padded message, then absorbs and squeezes byte by byte
fn sponge(rounds: usize, rate: usize, input: &[u8], suffix: u8, out_len: usize) -> Vec<u8> {
    let mut padded = input.to_vec();
    padded.push(suffix);
    while padded.len() % rate != 0 {
        padded.push(0);
    }
    let last = padded.len() - 1;
    padded[last] ^= 0x80;

    let mut state = [0u64; 25];
    for block in padded.chunks(rate) {
        for (i, &b) in block.iter().enumerate() {
            state[i / 8] ^= (b as u64) << (8 * (i % 8));
        }
        keccak::p1600(&mut state, rounds);
    }

    let mut out = Vec::with_capacity(out_len);
    loop {
        for i in 0..rate {
            if out.len() == out_len {
                return out;
            }
            out.push((state[i / 8] >> (8 * (i % 8))) as u8);
        }
        keccak::p1600(&mut state, rounds);
    }
}

fn length_encode(x: usize) -> Vec<u8> {
    let mut out: Vec<u8> = x
        .to_be_bytes()
        .iter()
        .copied()
        .skip_while(|&b| b == 0)
        .collect();
    out.push(out.len() as u8);
    out
}

fn tree_hash(t: Tree, m: &[u8], c: &[u8], out_len: usize) -> Vec<u8> {
    let mut s = m.to_vec();
    s.extend_from_slice(c);
    s.extend(length_encode(c.len()));

    if s.len() <= CHUNK {
        return sponge(t.rounds, t.rate, &s, 0x07, out_len);
    }

    let mut node = s[..CHUNK].to_vec();
    node.extend_from_slice(&[0x03, 0, 0, 0, 0, 0, 0, 0]);
    let leaves: Vec<&[u8]> = s[CHUNK..].chunks(CHUNK).collect();
    for leaf in &leaves {
        node.extend(sponge(t.rounds, t.rate, leaf, 0x0b, t.cv_len));
    }
    node.extend(length_encode(leaves.len()));
    node.extend_from_slice(&[0xff, 0xff]);
    sponge(t.rounds, t.rate, &node, 0x06, out_len)
}

fn m14(m: &[u8], c: &[u8], out_len: usize) -> Vec<u8> {
    let mut out = vec![0; out_len];
    kangaroo::m14_hash(m, c, &mut out);
    out
}

#[test]
fn standalone_sponge_is_shake256() {
    for len in [0, 1, 135, 136, 137, 1000] {
        let input = ptn(len);
        let mut expected = vec![0; 300];
        let mut h = Shake256::default();
        h.update(&input);
        h.finalize_xof().read(&mut expected);

        assert_eq!(sponge(24, 136, &input, 0x1f, 300), expected, "len {}", len);
    }
}

#[test]
fn standalone_tree_reproduces_kangaroo_twelve() {
    let cases = [
        (0, "1ac2d450fc3b4205d19da7bfca1b37513c0803577ac7167f06fe2ce1f0ef39e5"),
        (17, "6bf75fa2239198db4772e36478f8e19b0f371205f6a9a93a273f51df37122888"),
        (17 * 17 * 17, "cb552e2ec77d9910701d578b457ddf772c12e322e4ee7fe417f92c758f0d59d0"),
        (8191, "1b577636f723643e990cc7d6a659837436fd6a103626600eb8301cd1dbe553d6"),
    ];
    for (len, expected) in cases {
        assert_eq!(
            hex::encode(tree_hash(KANGAROO_TWELVE, &ptn(len), b"", 32)),
            expected,
            "ptn({})",
            len
        );
    }

    assert_eq!(
        hex::encode(tree_hash(KANGAROO_TWELVE, &PTN_83521, b"", 32)),
        "8701045e22205345ff4dda05555cbb5c3af1a771c2b89baef37db43d9998b9fe"
    );
    assert_eq!(
        hex::encode(tree_hash(KANGAROO_TWELVE, &[0xff], &ptn(41), 32)),
        "d848c5068ced736f4462159b9867fd4c20b808acc3d5bc48e0b06ba0a3762ec4"
    );
}

#[test]
fn marsupilami_fourteen_messages() {
    for len in [0, 1, 17, 17 * 17, 17 * 17 * 17, 8190, 8191, 8192, 8193, 2 * CHUNK + 1] {
        let m = ptn(len);
        assert_eq!(
            m14(&m, b"", 64),
            tree_hash(MARSUPILAMI_FOURTEEN, &m, b"", 64),
            "ptn({})",
            len
        );
    }

    assert_eq!(
        m14(&PTN_83521, b"", 64),
        tree_hash(MARSUPILAMI_FOURTEEN, &PTN_83521, b"", 64)
    );
}

#[test]
fn marsupilami_fourteen_customization_and_long_output() {
    for (m, c) in [
        (Vec::new(), ptn(1)),
        (vec![0xff], ptn(41)),
        (vec![0xff; 3], ptn(41 * 41)),
        (ptn(8000), ptn(300)),
    ] {
        assert_eq!(
            m14(&m, &c, 64),
            tree_hash(MARSUPILAMI_FOURTEEN, &m, &c, 64),
            "|M| {} |C| {}",
            m.len(),
            c.len()
        );
    }

    let long = m14(b"", b"", 1000);
    assert_eq!(long, tree_hash(MARSUPILAMI_FOURTEEN, b"", b"", 1000));
}

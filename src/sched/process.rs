//! # Process
//!
//! Container de execução: um VAS (compartilhado), uma tabela de capabilities,
//! a flag `started` (false → true, só uma vez) e referências fracas às
//! threads criadas.
//!
//! Todo o estado mutável vive atrás de um único `IrqMutex`. Ordem de locks:
//! `Mailbox` → `Process`; nunca dois processos ao mesmo tempo.

use super::error::{ProcError, ProcResult};
use super::state::ThreadState;
use super::thread::{Thread, Tid};
use crate::kernel::Kernel;
use crate::mm::{Vas, VirtAddr};
use crate::object::{
    generate_koid, CapError, CapResult, CapabilityTable, Handle, KObject, Koid, Rights, Token,
};
use crate::sync::IrqMutex;
use alloc::collections::BTreeMap;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;

struct ProcessInner {
    handles: CapabilityTable,
    started: bool,
    terminated: bool,
    threads: BTreeMap<Tid, Weak<Thread>>,
}

pub struct Process {
    koid: Koid,
    kernel: Arc<Kernel>,
    vas: Arc<Vas>,
    /// Entropia misturada aos tokens deste processo
    token_salt: u64,
    inner: IrqMutex<ProcessInner>,
}

impl Process {
    /// Construção pura: o processo não é iniciado.
    pub(crate) fn new(kernel: Arc<Kernel>, vas: Arc<Vas>) -> Self {
        let token_salt = kernel.cpu().random_u64();
        Self {
            koid: generate_koid(),
            kernel,
            vas,
            token_salt,
            inner: IrqMutex::new(ProcessInner {
                handles: CapabilityTable::new(),
                started: false,
                terminated: false,
                threads: BTreeMap::new(),
            }),
        }
    }

    #[inline]
    pub fn kernel(&self) -> &Arc<Kernel> {
        &self.kernel
    }

    #[inline]
    pub fn vas(&self) -> &Arc<Vas> {
        &self.vas
    }

    pub fn is_started(&self) -> bool {
        self.inner.lock(self.kernel.cpu()).started
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.lock(self.kernel.cpu()).terminated
    }

    // =========================================================================
    // TABELA DE CAPABILITIES
    // =========================================================================

    /// Registra `handle` e retorna um token novo, único neste processo.
    ///
    /// A geração é repetida até achar um valor livre; a verificação e a
    /// inserção acontecem sob o mesmo lock.
    pub fn register_for_token(&self, handle: Arc<Handle>) -> CapResult<Token> {
        let mut inner = self.inner.lock(self.kernel.cpu());
        if inner.terminated {
            return Err(CapError::ProcessDead);
        }
        Ok(self.insert_fresh(&mut inner, handle))
    }

    /// Gera um token livre e insere `handle` sob ele, com o lock já tomado.
    fn insert_fresh(&self, inner: &mut ProcessInner, handle: Arc<Handle>) -> Token {
        let owner = self.koid ^ self.token_salt;
        let handle_id = Handle::identity(&handle);

        let mut attempt = 0u64;
        let token = loop {
            let candidate = Token::generate(owner, handle_id, self.kernel.clock().now(), attempt);
            if !inner.handles.contains(candidate) {
                break candidate;
            }
            attempt = attempt.wrapping_add(1);
        };

        if !inner.handles.insert(token, handle) {
            kerror!("(Proc) Inserção de token falhou após verificação de unicidade:", token.raw());
            panic!("capability table corrupted");
        }

        ktrace!("(Proc) token registrado=", token.raw());
        token
    }

    /// Remove `token` da tabela e devolve o handle.
    pub fn unregister_token(&self, token: Token) -> CapResult<Arc<Handle>> {
        let removed = self.inner.lock(self.kernel.cpu()).handles.remove(token);
        removed.ok_or_else(|| {
            kwarn!("(Proc) unregister_token: token desconhecido=", token.raw());
            CapError::InvalidToken
        })
    }

    /// Devolve à tabela um handle tirado por `unregister_token` cuja operação
    /// falhou.
    ///
    /// Volta sob o mesmo `token` se ele continuar livre; senão recebe um novo.
    pub fn restore_token(&self, token: Token, handle: Arc<Handle>) -> CapResult<Token> {
        {
            let mut inner = self.inner.lock(self.kernel.cpu());
            if inner.terminated {
                return Err(CapError::ProcessDead);
            }
            if inner.handles.insert(token, handle.clone()) {
                ktrace!("(Proc) token restaurado=", token.raw());
                return Ok(token);
            }
        }
        kwarn!("(Proc) restore_token: token reutilizado, gerando outro=", token.raw());
        self.register_for_token(handle)
    }

    /// Consulta sem remover.
    pub fn get_handle(&self, token: Token) -> Option<Arc<Handle>> {
        self.inner.lock(self.kernel.cpu()).handles.get(token).cloned()
    }

    pub fn token_count(&self) -> usize {
        self.inner.lock(self.kernel.cpu()).handles.len()
    }

    /// Registra uma cópia de `token` com direitos `rights` (iguais ou menores).
    ///
    /// Exige o direito `CLONE` no handle original.
    pub fn duplicate_token(&self, token: Token, rights: Rights) -> CapResult<Token> {
        let handle = self.get_handle(token).ok_or(CapError::InvalidToken)?;
        if !handle.has_permissions(Rights::CLONE) {
            return Err(CapError::NotAllowed);
        }
        let copy = handle.derive(rights).ok_or(CapError::NotAllowed)?;
        self.register_for_token(Arc::new(copy))
    }

    // =========================================================================
    // THREADS
    // =========================================================================

    /// Cria uma thread neste processo, marcando-o como iniciado.
    ///
    /// Idempotente quanto à flag: chamadas seguintes criam mais threads.
    pub fn create_thread(self: &Arc<Self>) -> ProcResult<Arc<Thread>> {
        let mut inner = self.inner.lock(self.kernel.cpu());
        if inner.terminated {
            return Err(ProcError::Terminated);
        }
        Ok(self.spawn_thread(&mut inner))
    }

    fn spawn_thread(self: &Arc<Self>, inner: &mut ProcessInner) -> Arc<Thread> {
        inner.started = true;

        let thread = Arc::new(Thread::new(self.clone(), self.kernel.clock().now()));
        inner.threads.insert(thread.tid(), Arc::downgrade(&thread));
        inner.threads.retain(|_, t| t.strong_count() > 0);

        ktrace!("(Proc) thread criada tid=", thread.tid().as_u64());
        thread
    }

    /// Threads ainda vivas.
    pub fn threads(&self) -> Vec<Arc<Thread>> {
        self.inner
            .lock(self.kernel.cpu())
            .threads
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Inicia este processo a pedido de `caller`.
    ///
    /// 1. Resolve `bootstrap` na tabela do chamador (`InvalidToken`).
    /// 2. Exige `TRANSFER` no handle (`NotAllowed`).
    /// 3. Tira o handle da tabela do chamador (um release concorrente faz o
    ///    start falhar aqui com `InvalidToken`, sem efeito no alvo).
    /// 4. Sob o lock deste processo: check-and-set de `started`
    ///    (`AlreadyStarted`, `Terminated`), registro do handle e criação da
    ///    thread, de uma vez.
    /// 5. Monta o contexto de usuário e entrega a thread ao scheduler.
    ///
    /// Se o passo 4 recusar, o handle volta ao chamador sob o mesmo token.
    /// O argumento 0 da thread é o token re-registrado aqui.
    pub fn start(
        self: &Arc<Self>,
        caller: &Process,
        bootstrap: Token,
        entry: VirtAddr,
        stack: VirtAddr,
    ) -> ProcResult<Arc<Thread>> {
        let handle = caller.get_handle(bootstrap).ok_or(CapError::InvalidToken)?;
        if !handle.has_permissions(Rights::TRANSFER) {
            kwarn!("(Proc) start: token sem TRANSFER=", bootstrap.raw());
            return Err(CapError::NotAllowed.into());
        }

        let handle = caller.unregister_token(bootstrap)?;

        let committed = {
            let mut inner = self.inner.lock(self.kernel.cpu());
            if inner.terminated {
                Err((ProcError::Terminated, handle))
            } else if inner.started {
                Err((ProcError::AlreadyStarted, handle))
            } else {
                let token = self.insert_fresh(&mut inner, handle);
                Ok((token, self.spawn_thread(&mut inner)))
            }
        };

        // Fora do lock do alvo: nunca dois processos travados
        let (token, thread) = match committed {
            Ok(committed) => committed,
            Err((error, handle)) => {
                kwarn!("(Proc) start recusado koid=", self.koid);
                kwarn!(error.as_str());
                if caller.restore_token(bootstrap, handle).is_err() {
                    kwarn!("(Proc) start: chamador terminou, bootstrap descartado=", bootstrap.raw());
                }
                return Err(error);
            }
        };

        thread.update_context(|ctx| {
            ctx.set_userspace();
            ctx.set_instruction_pointer(entry);
            ctx.set_stack_pointer(stack);
            ctx.set_argument(0, token.raw());
        });
        thread.set_state(ThreadState::Ready);
        self.kernel.sched().schedule(thread.clone());

        kinfo!("(Proc) processo iniciado koid=", self.koid);
        Ok(thread)
    }

    /// Termina o processo: esvazia a tabela e marca as threads como `Exited`.
    ///
    /// Depois disso `register_for_token` e `create_thread` falham.
    pub fn terminate(&self) {
        let (handles, threads) = {
            let mut inner = self.inner.lock(self.kernel.cpu());
            inner.terminated = true;
            let handles = inner.handles.drain();
            let threads = core::mem::take(&mut inner.threads);
            (handles, threads)
        };

        for thread in threads.values().filter_map(Weak::upgrade) {
            thread.set_state(ThreadState::Exited);
        }
        // Handles caem fora do lock: podem destruir VAS e processos
        drop(handles);

        kinfo!("(Proc) processo terminado koid=", self.koid);
    }
}

impl KObject for Process {
    fn koid(&self) -> Koid {
        self.koid
    }

    fn type_name(&self) -> &'static str {
        "Process"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::{mock_kernel, MockPlatform};
    use crate::mm::{PhysAddr, Vmo};
    use crate::object::KernelObject;
    use std::collections::BTreeSet;

    fn setup() -> (Arc<MockPlatform>, Arc<Kernel>, Arc<Process>) {
        let (platform, kernel) = mock_kernel();
        let vas = kernel.create_vas(false).unwrap();
        let process = kernel.create_process(vas);
        (platform, kernel, process)
    }

    fn vmo_handle(kernel: &Kernel, rights: Rights) -> Arc<Handle> {
        let vmo = Arc::new(Vmo::physical(PhysAddr::new(0x1000), 0x1000, 0).unwrap());
        kernel.create_handle(KernelObject::Vmo(vmo), rights)
    }

    #[test]
    fn test_token_round_trip() {
        let (_platform, kernel, process) = setup();
        let handle = vmo_handle(&kernel, Rights::READ);

        let token = process.register_for_token(handle.clone()).unwrap();
        assert!(!token.is_none());
        let found = process.get_handle(token).unwrap();
        assert!(Arc::ptr_eq(&found, &handle));

        let removed = process.unregister_token(token).unwrap();
        assert!(Arc::ptr_eq(&removed, &handle));
        assert!(process.get_handle(token).is_none());
        assert_eq!(process.unregister_token(token).err(), Some(CapError::InvalidToken));
    }

    #[test]
    fn test_tokens_unique_with_frozen_clock() {
        let (platform, kernel, process) = setup();
        platform.set_clock_step(0);

        // Mesmo handle, mesmo timestamp: só a tentativa diferencia
        let handle = vmo_handle(&kernel, Rights::READ);
        let mut seen = BTreeSet::new();
        for _ in 0..256 {
            let token = process.register_for_token(handle.clone()).unwrap();
            assert!(seen.insert(token));
        }
        assert_eq!(process.token_count(), 256);
    }

    #[test]
    fn test_tokens_unique_under_concurrency() {
        let (_platform, kernel, process) = setup();

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let process = process.clone();
                let kernel = kernel.clone();
                std::thread::spawn(move || {
                    let mut tokens = Vec::new();
                    for _ in 0..200 {
                        let handle = vmo_handle(&kernel, Rights::READ);
                        tokens.push(process.register_for_token(handle).unwrap());
                    }
                    tokens
                })
            })
            .collect();

        let mut all = BTreeSet::new();
        for worker in workers {
            for token in worker.join().unwrap() {
                assert!(all.insert(token), "token duplicado");
            }
        }
        assert_eq!(all.len(), 1600);
        assert_eq!(process.token_count(), 1600);
    }

    #[test]
    fn test_tokens_are_process_local() {
        let (_platform, kernel, a) = setup();
        let b = kernel.create_process(kernel.create_vas(false).unwrap());

        let token = a.register_for_token(vmo_handle(&kernel, Rights::READ)).unwrap();
        assert!(b.get_handle(token).is_none());
        assert_eq!(b.unregister_token(token).err(), Some(CapError::InvalidToken));
        assert!(a.get_handle(token).is_some());
    }

    #[test]
    fn test_duplicate_token() {
        let (_platform, kernel, process) = setup();
        let token = process
            .register_for_token(vmo_handle(&kernel, Rights::READ | Rights::WRITE | Rights::CLONE))
            .unwrap();

        let copy = process.duplicate_token(token, Rights::READ).unwrap();
        assert_ne!(copy, token);
        let original = process.get_handle(token).unwrap();
        let reduced = process.get_handle(copy).unwrap();
        assert_eq!(reduced.rights(), Rights::READ);
        assert_eq!(reduced.object().koid(), original.object().koid());

        // Sem CLONE e tentando elevar direitos
        assert_eq!(process.duplicate_token(copy, Rights::READ).err(), Some(CapError::NotAllowed));
        assert_eq!(
            process.duplicate_token(token, Rights::TRANSFER).err(),
            Some(CapError::NotAllowed)
        );
        assert_eq!(
            process.duplicate_token(Token::from_raw(7), Rights::READ).err(),
            Some(CapError::InvalidToken)
        );
    }

    #[test]
    fn test_create_thread_marks_started() {
        let (platform, _kernel, process) = setup();
        assert!(!process.is_started());

        let before = platform.peek_now();
        let first = process.create_thread().unwrap();
        assert!(process.is_started());
        assert!(first.created_at() >= before);
        assert_eq!(first.state(), ThreadState::Created);

        let second = process.create_thread().unwrap();
        assert_ne!(first.tid(), second.tid());
        assert_eq!(process.threads().len(), 2);
        assert!(Arc::ptr_eq(second.process(), &process));

        drop(first);
        assert_eq!(process.threads().len(), 1);
    }

    #[test]
    fn test_start_moves_bootstrap_token() {
        let (platform, kernel, caller) = setup();
        let target = kernel.create_process(kernel.create_vas(false).unwrap());
        let handle = vmo_handle(&kernel, Rights::READ | Rights::TRANSFER);
        let bootstrap = caller.register_for_token(handle.clone()).unwrap();

        let thread = target
            .start(&caller, bootstrap, VirtAddr::new(0x40_1000), VirtAddr::new(0x7FFF_F000))
            .unwrap();

        // Capability se move, não é duplicada
        assert!(caller.get_handle(bootstrap).is_none());
        assert_eq!(target.token_count(), 1);

        let ctx = thread.context();
        assert!(ctx.userspace);
        assert_eq!(ctx.rip, 0x40_1000);
        assert_eq!(ctx.rsp, 0x7FFF_F000);
        let moved = target.get_handle(Token::from_raw(ctx.args[0])).unwrap();
        assert!(Arc::ptr_eq(&moved, &handle));

        assert_eq!(thread.state(), ThreadState::Ready);
        let scheduled = platform.scheduled();
        assert_eq!(scheduled.len(), 1);
        assert!(Arc::ptr_eq(&scheduled[0], &thread));
        assert!(target.is_started());
    }

    #[test]
    fn test_start_error_paths() {
        let (platform, kernel, caller) = setup();
        let target = kernel.create_process(kernel.create_vas(false).unwrap());

        // Token desconhecido
        let err = target.start(&caller, Token::from_raw(42), VirtAddr::new(0), VirtAddr::new(0));
        assert_eq!(err.err(), Some(ProcError::Cap(CapError::InvalidToken)));

        // Sem TRANSFER: nenhuma tabela muda
        let no_transfer = caller
            .register_for_token(vmo_handle(&kernel, Rights::READ | Rights::WRITE))
            .unwrap();
        let err = target.start(&caller, no_transfer, VirtAddr::new(0), VirtAddr::new(0));
        assert_eq!(err.err(), Some(ProcError::Cap(CapError::NotAllowed)));
        assert!(caller.get_handle(no_transfer).is_some());
        assert_eq!(target.token_count(), 0);
        assert!(!target.is_started());

        // Já iniciado (por create_thread)
        target.create_thread().unwrap();
        let ok = caller
            .register_for_token(vmo_handle(&kernel, Rights::TRANSFER))
            .unwrap();
        let err = target.start(&caller, ok, VirtAddr::new(0), VirtAddr::new(0));
        assert_eq!(err.err(), Some(ProcError::AlreadyStarted));
        assert!(caller.get_handle(ok).is_some());
        assert!(platform.scheduled().is_empty());
    }

    #[test]
    fn test_start_on_terminated_keeps_bootstrap() {
        let (platform, kernel, caller) = setup();
        let target = kernel.create_process(kernel.create_vas(false).unwrap());
        let handle = vmo_handle(&kernel, Rights::TRANSFER);
        let bootstrap = caller.register_for_token(handle.clone()).unwrap();

        target.terminate();
        let err = target.start(&caller, bootstrap, VirtAddr::new(0x1000), VirtAddr::new(0x2000));
        assert_eq!(err.err(), Some(ProcError::Terminated));

        // O handle voltou sob o mesmo token; o alvo não foi marcado
        let back = caller.get_handle(bootstrap).unwrap();
        assert!(Arc::ptr_eq(&back, &handle));
        assert!(!target.is_started());
        assert_eq!(target.token_count(), 0);
        assert!(platform.scheduled().is_empty());
    }

    #[test]
    fn test_start_with_released_bootstrap() {
        let (_platform, kernel, caller) = setup();
        let target = kernel.create_process(kernel.create_vas(false).unwrap());
        let bootstrap = caller
            .register_for_token(vmo_handle(&kernel, Rights::TRANSFER))
            .unwrap();

        caller.unregister_token(bootstrap).unwrap();
        let err = target.start(&caller, bootstrap, VirtAddr::new(0x1000), VirtAddr::new(0x2000));
        assert_eq!(err.err(), Some(ProcError::Cap(CapError::InvalidToken)));
        assert!(!target.is_started());
        // Um start legítimo depois ainda funciona
        let fresh = caller
            .register_for_token(vmo_handle(&kernel, Rights::TRANSFER))
            .unwrap();
        assert!(target
            .start(&caller, fresh, VirtAddr::new(0x1000), VirtAddr::new(0x2000))
            .is_ok());
    }

    #[test]
    fn test_restore_token() {
        let (_platform, kernel, process) = setup();
        let handle = vmo_handle(&kernel, Rights::READ);
        let token = process.register_for_token(handle.clone()).unwrap();

        let removed = process.unregister_token(token).unwrap();
        assert_eq!(process.restore_token(token, removed).unwrap(), token);
        assert!(Arc::ptr_eq(&process.get_handle(token).unwrap(), &handle));

        // Token ocupado: o handle recebe outro
        let other = vmo_handle(&kernel, Rights::READ);
        let fresh = process.restore_token(token, other.clone()).unwrap();
        assert_ne!(fresh, token);
        assert!(Arc::ptr_eq(&process.get_handle(fresh).unwrap(), &other));
        assert_eq!(process.token_count(), 2);

        process.terminate();
        assert_eq!(
            process.restore_token(token, handle).err(),
            Some(CapError::ProcessDead)
        );
    }

    #[test]
    fn test_single_start_under_concurrency() {
        let (platform, kernel, caller) = setup();
        let target = kernel.create_process(kernel.create_vas(false).unwrap());

        let tokens: Vec<Token> = (0..16)
            .map(|_| {
                caller
                    .register_for_token(vmo_handle(&kernel, Rights::TRANSFER))
                    .unwrap()
            })
            .collect();

        let racers: Vec<_> = tokens
            .into_iter()
            .map(|token| {
                let caller = caller.clone();
                let target = target.clone();
                std::thread::spawn(move || {
                    target
                        .start(&caller, token, VirtAddr::new(0x1000), VirtAddr::new(0x2000))
                        .map(|_| ())
                })
            })
            .collect();

        let results: Vec<_> = racers.into_iter().map(|r| r.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| *r == Err(ProcError::AlreadyStarted)));

        assert_eq!(caller.token_count(), 15);
        assert_eq!(target.token_count(), 1);
        assert_eq!(platform.scheduled().len(), 1);
    }

    #[test]
    fn test_terminate() {
        let (_platform, kernel, process) = setup();
        let thread = process.create_thread().unwrap();
        let handle = vmo_handle(&kernel, Rights::READ);
        let token = process.register_for_token(handle.clone()).unwrap();

        process.terminate();
        assert!(process.is_terminated());
        assert!(process.get_handle(token).is_none());
        assert_eq!(thread.state(), ThreadState::Exited);
        // Só o teste segura o handle agora
        assert_eq!(Arc::strong_count(&handle), 1);

        assert_eq!(process.register_for_token(handle).err(), Some(CapError::ProcessDead));
        assert_eq!(process.create_thread().err(), Some(ProcError::Terminated));
    }
}
